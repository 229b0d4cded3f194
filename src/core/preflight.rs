//! # Preflight Module / 预检模块
//!
//! Checks, once and before any test case runs, that the external runner and at
//! least one supported simulator are installed.
//!
//! 在任何测试用例运行之前检查一次：外部运行器以及至少一个受支持的仿真器是否已安装。

use std::path::PathBuf;

use crate::core::config::RunnerConfig;
use crate::core::environment::AmbientEnvironment;
use crate::core::error::RunnerError;
use crate::infra::fs::find_in_path;

/// Tools found by [`check_dependencies`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub runner: PathBuf,
    /// `(name, path)` of every configured simulator that was found.
    pub simulators: Vec<(String, PathBuf)>,
}

/// Name of the runner executable: the first token of the runner command.
pub fn runner_program(config: &RunnerConfig) -> Result<String, RunnerError> {
    shlex::split(&config.runner_command)
        .and_then(|parts| parts.into_iter().next())
        .ok_or_else(|| RunnerError::InvalidCommand(config.runner_command.clone()))
}

/// Remediation hint for a missing program.
/// 缺失程序的修复提示。
pub fn install_hint(program: &str) -> String {
    match program {
        "pytest" => "pip install pytest cocotb cocotb-bus".to_string(),
        "iverilog" => "sudo apt-get install iverilog  # Icarus Verilog".to_string(),
        "verilator" => "sudo apt-get install verilator".to_string(),
        other => format!("install `{other}` and make sure it is on PATH"),
    }
}

/// Verifies the runner executable and at least one simulator are on `PATH`.
///
/// # Errors
/// `MissingDependency` naming the runner, or the simulator list, with an
/// install hint.
///
/// 验证运行器可执行文件和至少一个仿真器位于 `PATH` 上。
pub fn check_dependencies(
    config: &RunnerConfig,
    ambient: &AmbientEnvironment,
) -> Result<Toolchain, RunnerError> {
    let path_var = ambient.get("PATH").map(String::as_str);

    let program = runner_program(config)?;
    let runner = find_in_path(&program, path_var).ok_or_else(|| RunnerError::MissingDependency {
        hint: install_hint(&program),
        program: program.clone(),
    })?;

    let simulators: Vec<(String, PathBuf)> = config
        .simulators
        .iter()
        .filter_map(|sim| find_in_path(sim, path_var).map(|p| (sim.clone(), p)))
        .collect();

    if simulators.is_empty() && !config.simulators.is_empty() {
        let hint = config
            .simulators
            .iter()
            .map(|s| install_hint(s))
            .collect::<Vec<_>>()
            .join("\n        ");
        return Err(RunnerError::MissingDependency {
            program: config.simulators.join(" | "),
            hint,
        });
    }

    Ok(Toolchain { runner, simulators })
}
