//! # Test Execution Engine Module / 测试执行引擎模块
//!
//! This module runs a single test case end to end: materialize its files,
//! resolve its environment, check its simulator, invoke the external runner
//! under a timeout, and persist the combined log.
//!
//! 此模块端到端地运行单个测试用例：物化文件、解析环境、检查仿真器、
//! 在超时限制下调用外部运行器，并持久化合并日志。

use colored::*;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::RunnerConfig,
        environment::{resolve_environment, AmbientEnvironment, EnvironmentPolicy, ResolvedEnvironment},
        error::RunnerError,
        models::{format_log, ExecutionResult, Outcome, TestCase},
        preflight::install_hint,
    },
    infra::{
        command::{spawn_and_capture, WaitOutcome},
        fs::{find_in_path, materialize, test_dir, MaterializedTestDir},
        t,
    },
};

/// Everything a test case needs from the batch, shared read-only between
/// concurrently running cases.
///
/// 测试用例从批次中所需的一切，在并发运行的用例之间只读共享。
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: Arc<RunnerConfig>,
    pub ambient: Arc<AmbientEnvironment>,
    pub policy: Arc<EnvironmentPolicy>,
    /// Root under which `<id>/` directories are created.
    pub prefix: PathBuf,
    /// Batch-level cancellation; fires on Ctrl-C.
    pub cancel: CancellationToken,
    pub locale: String,
}

impl RunContext {
    pub fn new(
        config: RunnerConfig,
        ambient: AmbientEnvironment,
        prefix: PathBuf,
        cancel: CancellationToken,
        locale: &str,
    ) -> Self {
        let policy = config.environment_policy();
        Self {
            config: Arc::new(config),
            ambient: Arc::new(ambient),
            policy: Arc::new(policy),
            prefix,
            cancel,
            locale: locale.to_string(),
        }
    }
}

/// The main entry point for running a single test case.
/// Never fails: every problem becomes the `error` outcome of the returned
/// result, so one bad test case cannot abort the batch.
///
/// 运行单个测试用例的主入口。永不失败：每个问题都会变成返回结果中的 `error` 结果，
/// 因此一个有问题的测试用例不会中止整个批次。
pub async fn run_test_case(case: &TestCase, ctx: &RunContext) -> ExecutionResult {
    let locale = ctx.locale.as_str();

    let dir = match prepare_test_dir(case, ctx) {
        Ok(dir) => dir,
        Err(e) => {
            println!(
                "{}",
                t!("run.materialize_failed", locale = locale, error = &e).red()
            );
            return ExecutionResult::error(e.to_string());
        }
    };

    let env = match resolve_environment(case, &dir.root, &ctx.ambient, &ctx.policy) {
        Ok(env) => env,
        Err(e) => {
            println!("{}", t!("run.env_failed", locale = locale, error = &e).red());
            return ExecutionResult::error(e.to_string());
        }
    };

    run_in_dir(&dir, &env, ctx).await
}

/// Materializes `case` under `<prefix>/<id>/` and reports what was written.
pub fn prepare_test_dir(case: &TestCase, ctx: &RunContext) -> Result<MaterializedTestDir, RunnerError> {
    let locale = ctx.locale.as_str();
    println!("{}", t!("run.extracting", locale = locale).blue());

    let dir = materialize(
        case,
        &test_dir(&ctx.prefix, &case.id),
        &ctx.config.skip_files,
    )?;
    for path in &dir.written {
        println!("{}", t!("run.created", locale = locale, path = path));
    }
    for path in &dir.skipped {
        println!(
            "{}",
            t!("run.skipped", locale = locale, path = path).dimmed()
        );
    }
    Ok(dir)
}

/// Builds the runner argv for a materialized test directory.
///
/// The configured command is split with shell rules, each token has `$VAR`
/// expanded from the resolved environment, then the directory placeholders
/// are substituted.
///
/// 为已物化的测试目录构建运行器参数列表。
pub fn build_invocation(
    config: &RunnerConfig,
    dir: &MaterializedTestDir,
    env: &ResolvedEnvironment,
) -> Result<Vec<String>, RunnerError> {
    let parts = shlex::split(&config.runner_command)
        .filter(|parts| !parts.is_empty())
        .ok_or_else(|| RunnerError::InvalidCommand(config.runner_command.clone()))?;

    let placeholders = [
        ("{test_dir}", dir.root.clone()),
        ("{src_dir}", dir.src_dir()),
        ("{rundir}", dir.run_dir()),
        ("{cache_dir}", dir.run_dir().join(".cache")),
        ("{test_runner}", dir.root.join(&config.test_runner)),
    ];

    Ok(parts
        .iter()
        .map(|token| {
            let expanded =
                shellexpand::env_with_context_no_errors(token, |var| env.get(var));
            placeholders
                .iter()
                .fold(expanded.into_owned(), |acc, (key, value)| {
                    acc.replace(key, &value.to_string_lossy())
                })
        })
        .collect())
}

async fn run_in_dir(
    dir: &MaterializedTestDir,
    env: &ResolvedEnvironment,
    ctx: &RunContext,
) -> ExecutionResult {
    let locale = ctx.locale.as_str();
    let config = &ctx.config;
    let path_var = env.get("PATH");

    // The simulator named by SIM must exist before anything is started.
    let sim = env.sim();
    let sim_binary = config.simulator_binary(sim);
    if find_in_path(sim_binary, path_var).is_none() {
        println!(
            "{}",
            t!("run.simulator_missing", locale = locale, sim = sim_binary).red()
        );
        println!(
            "{}",
            t!("run.install_hint", locale = locale, hint = install_hint(sim_binary)).yellow()
        );
        return ExecutionResult::error(format!("Simulator {sim_binary} not installed"));
    }

    let argv = match build_invocation(config, dir, env) {
        Ok(argv) => argv,
        Err(e) => return ExecutionResult::error(e.to_string()),
    };
    let Some(program) = find_in_path(&argv[0], path_var) else {
        return ExecutionResult::error(
            RunnerError::MissingDependency {
                hint: install_hint(&argv[0]),
                program: argv[0].clone(),
            }
            .to_string(),
        );
    };

    let mut cmd = tokio::process::Command::new(&program);
    cmd.args(&argv[1..])
        .env_clear()
        .envs(env.iter())
        .current_dir(dir.run_dir());

    println!(
        "{}",
        t!("run.running_tests", locale = locale, sim = sim).blue()
    );

    let start_time = Instant::now();
    let spawned = spawn_and_capture(cmd, config.timeout(), &ctx.cancel).await;
    let duration = start_time.elapsed();
    let secs = format!("{:.2}", duration.as_secs_f64());

    let (wait, output) = match spawned {
        Ok(pair) => pair,
        Err(e) => {
            println!("{}", t!("run.start_failed", locale = locale, error = &e).red());
            return ExecutionResult {
                duration,
                ..ExecutionResult::error(format!("failed to start {}: {e}", program.display()))
            };
        }
    };

    let (outcome, exit_code, message) = match wait {
        WaitOutcome::Exited(status) if status.success() => (Outcome::Success, status.code(), None),
        WaitOutcome::Exited(status) => (
            Outcome::Failure,
            status.code(),
            Some(match status.code() {
                Some(code) => format!("exited with code {code}"),
                None => "terminated by signal".to_string(),
            }),
        ),
        WaitOutcome::TimedOut => (
            Outcome::Timeout,
            None,
            Some(format!("timed out after {}s", config.timeout_secs)),
        ),
        WaitOutcome::Cancelled => (Outcome::Error, None, Some("cancelled".to_string())),
    };

    let mut log = format_log(&output.stdout, &output.stderr);
    if let Some(msg) = message.as_ref().filter(|_| outcome != Outcome::Failure) {
        log.push_str(&format!("\n=== {} ===\n", msg.to_uppercase()));
    }
    let log_path = dir.root.join(&config.log_file);

    let mut result = ExecutionResult {
        outcome,
        exit_code,
        stdout: output.stdout,
        stderr: output.stderr,
        duration,
        log_path: Some(log_path.clone()),
        message,
    };

    if let Err(e) = fs::write(&log_path, log) {
        let err = RunnerError::io(&log_path, e);
        println!(
            "{}",
            t!("run.log_write_failed", locale = locale, error = &err).red()
        );
        result.outcome = Outcome::Error;
        result.log_path = None;
        result.message = Some(err.to_string());
        return result;
    }

    match result.outcome {
        Outcome::Success => println!(
            "{}",
            t!("run.test_passed", locale = locale, duration = &secs).green()
        ),
        Outcome::Failure => {
            println!(
                "{}",
                t!("run.test_failed", locale = locale, duration = &secs).red()
            );
            println!(
                "{}",
                t!("run.see_log", locale = locale, path = log_path.display())
            );
        }
        Outcome::Timeout => {
            println!(
                "{}",
                t!("run.test_timeout", locale = locale, duration = &secs).red()
            );
            println!(
                "{}",
                t!("run.see_log", locale = locale, path = log_path.display())
            );
        }
        Outcome::Error => println!(
            "{}",
            t!("run.test_cancelled", locale = locale, duration = &secs).yellow()
        ),
    }

    result
}
