//! # Configuration Module / 配置模块
//!
//! Runner settings, loaded from an optional TOML file. Every field has a
//! default, so an absent file, or a file that sets only a few keys, is fine.
//! Command-line flags are applied on top by the `run` command.
//!
//! 运行器设置，从可选的 TOML 文件加载。每个字段都有默认值，
//! 因此缺少文件或只设置了少数键的文件都可以。命令行参数由 `run` 命令在其上覆盖。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::core::dataset::DEFAULT_ENV_FILE;
use crate::core::environment::EnvironmentPolicy;
use crate::core::error::RunnerError;
use crate::core::paths::{PathNormalizer, PrefixRule};

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_PREFIX: &str = "work_direct";
pub const DEFAULT_RUNNER_COMMAND: &str =
    "pytest -s --log-cli-level=INFO -o cache_dir={cache_dir} {test_runner} -v";

/// Fixed subdirectories created for every materialized test case.
pub const SKELETON_DIRS: [&str; 5] = ["rtl", "verif", "docs", "src", "rundir"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// `None` means detect from the system locale.
    ///
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。`None` 表示根据系统区域设置检测。
    pub language: Option<String>,
    /// Directory under which `<prefix>/<test-id>/` trees are created.
    pub prefix: String,
    /// Per-test timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum number of concurrently running test cases. `0` means one per CPU.
    pub jobs: usize,
    /// Command line of the external test runner. Split with shell rules;
    /// `$VAR` is expanded from the resolved test environment, then the placeholders
    /// `{test_dir}`, `{src_dir}`, `{rundir}`, `{cache_dir}` and `{test_runner}`
    /// are substituted.
    ///
    /// 外部测试运行器的命令行。按 shell 规则拆分；先从环境展开 `$VAR`，
    /// 再替换占位符。
    pub runner_command: String,
    /// Harness script the runner is pointed at, relative to the test directory.
    pub test_runner: String,
    /// Simulator binaries checked during preflight; at least one must exist.
    pub simulators: Vec<String>,
    /// `SIM` value → binary name. Unlisted values map to themselves.
    pub simulator_binaries: BTreeMap<String, String>,
    /// Variable that receives the test's `src` directory.
    pub search_path_var: String,
    /// Harness entry holding the `KEY=VALUE` declaration.
    pub env_file: String,
    /// Per-test log file name, relative to the test directory.
    pub log_file: String,
    /// Aggregate report file name, relative to the prefix.
    pub report_file: String,
    /// Entry names that are never materialized.
    pub skip_files: Vec<String>,
    /// Extra container prefixes, tried after the built-in ones.
    pub path_rules: Vec<PrefixRule>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            language: None,
            prefix: DEFAULT_PREFIX.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            jobs: 1,
            runner_command: DEFAULT_RUNNER_COMMAND.to_string(),
            test_runner: "src/test_runner.py".to_string(),
            simulators: vec!["iverilog".to_string(), "verilator".to_string()],
            simulator_binaries: BTreeMap::from([("icarus".to_string(), "iverilog".to_string())]),
            search_path_var: "PYTHONPATH".to_string(),
            env_file: DEFAULT_ENV_FILE.to_string(),
            log_file: "test_output.log".to_string(),
            report_file: "report.txt".to_string(),
            skip_files: vec!["Dockerfile".to_string(), "docker-compose.yml".to_string()],
            path_rules: Vec::new(),
        }
    }
}

impl RunnerConfig {
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let content = fs::read_to_string(path).map_err(|e| RunnerError::io(path, e))?;
        Self::from_toml_str(&content).map_err(|reason| RunnerError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let config: RunnerConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.runner_command.trim().is_empty() {
            return Err("`runner_command` must not be empty".to_string());
        }
        if self.prefix.trim().is_empty() {
            return Err("`prefix` must not be empty".to_string());
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Effective concurrency, never zero.
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get().max(1)
        } else {
            self.jobs
        }
    }

    /// Binary that implements the given `SIM` value.
    pub fn simulator_binary<'a>(&'a self, sim: &'a str) -> &'a str {
        self.simulator_binaries
            .get(sim)
            .map(String::as_str)
            .unwrap_or(sim)
    }

    pub fn environment_policy(&self) -> EnvironmentPolicy {
        EnvironmentPolicy {
            normalizer: PathNormalizer::default().with_rules(self.path_rules.iter().cloned()),
            search_path_var: self.search_path_var.clone(),
            env_file: self.env_file.clone(),
        }
    }
}
