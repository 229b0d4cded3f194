//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command: the batch orchestrator.
//! `Idle → Loading → {ProcessingTestCase}* → Reporting → Done`.
//!
//! 此模块实现 `run` 命令：批量编排器。

use anyhow::{Context, Result};
use colored::*;
use futures::{stream, StreamExt};
use std::{fs, path::PathBuf};
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::RunnerConfig,
        dataset::Dataset,
        environment::AmbientEnvironment,
        execution::{run_test_case, RunContext},
        models::{Report, TestCase},
        planner,
        preflight::check_dependencies,
    },
    infra::t,
    reporting::{generate_html_report, print_summary, write_json_report, write_text_report},
};

/// Arguments of the `run` command after CLI parsing.
/// 经 CLI 解析后的 `run` 命令参数。
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub dataset: PathBuf,
    pub id: Option<String>,
    pub categories: Vec<String>,
    pub prefix: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub jobs: Option<usize>,
    pub config: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub json: Option<PathBuf>,
}

/// Executes the `run` command. Returns an error when any processed test case
/// did not pass, so the process exit status is nonzero.
///
/// 执行 `run` 命令。当任何已处理的测试用例未通过时返回错误，使进程退出码非零。
pub async fn execute(args: RunArgs, locale: &str) -> Result<()> {
    let config = load_config(args.config.as_deref(), &args)?;
    let ambient = AmbientEnvironment::capture();
    let cancel = setup_signal_handler(locale);

    let report = run_batch(&args, config, ambient, cancel.clone(), locale).await?;

    if cancel.is_cancelled() {
        anyhow::bail!(t!("run.interrupted", locale = locale).to_string());
    }
    if !report.all_passed() {
        anyhow::bail!(t!("run.batch_failed", locale = locale, count = report.failed()).to_string());
    }
    println!("\n{}", t!("all_tests_passed", locale = locale).green().bold());
    Ok(())
}

/// Loads the optional config file and applies command-line overrides.
pub fn load_config(path: Option<&std::path::Path>, args: &RunArgs) -> Result<RunnerConfig> {
    let mut config = match path {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };
    if let Some(prefix) = &args.prefix {
        config.prefix = prefix.to_string_lossy().into_owned();
    }
    if let Some(timeout) = args.timeout_secs {
        config.timeout_secs = timeout;
    }
    if let Some(jobs) = args.jobs {
        config.jobs = jobs;
    }
    Ok(config)
}

/// Runs the whole pipeline with an explicit ambient environment and returns
/// the finished report. Fatal conditions (missing toolchain, unreadable or
/// empty dataset, unmatched identifier) are returned as errors before any
/// directory is created; per-test problems end up in the report.
///
/// 使用显式的环境快照运行整个流水线并返回最终报告。
/// 致命条件在创建任何目录之前以错误形式返回；单个测试的问题记录在报告中。
pub async fn run_batch(
    args: &RunArgs,
    config: RunnerConfig,
    ambient: AmbientEnvironment,
    cancel: CancellationToken,
    locale: &str,
) -> Result<Report> {
    println!("{}", t!("checking_prerequisites", locale = locale).bold());
    let toolchain = check_dependencies(&config, &ambient)?;
    for (name, _) in &toolchain.simulators {
        println!(
            "{}",
            t!("found_simulator", locale = locale, name = name).green()
        );
    }
    println!(
        "{}",
        t!("found_runner", locale = locale, path = toolchain.runner.display()).green()
    );
    println!();

    println!(
        "{}",
        t!("reading_dataset", locale = locale, path = args.dataset.display())
    );
    let dataset = Dataset::open(&args.dataset)?.with_env_file(config.env_file.clone());
    let cases = dataset.load_all()?;
    println!(
        "{}",
        t!("found_test_cases", locale = locale, count = cases.len())
    );

    let plan = planner::plan_execution(cases, args.id.as_deref(), &args.categories)?;
    match &args.id {
        Some(id) => println!("{}", t!("running_single", locale = locale, id = id).cyan()),
        None => println!(
            "{}",
            t!("running_all", locale = locale, count = plan.cases_to_run.len()).cyan()
        ),
    }
    if plan.filtered_category_count > 0 {
        println!(
            "{}",
            t!(
                "filtered_categories",
                locale = locale,
                filtered = plan.filtered_category_count,
                total = plan.dataset_count
            )
            .cyan()
        );
    }
    println!();

    let prefix = PathBuf::from(&config.prefix);
    fs::create_dir_all(&prefix)
        .with_context(|| format!("Failed to create output directory: {}", prefix.display()))?;
    let report_path = prefix.join(&config.report_file);

    let jobs = config.effective_jobs();
    let ctx = RunContext::new(config, ambient, prefix, cancel, locale);
    let report = run_cases(plan.cases_to_run, jobs, &ctx).await;

    write_text_report(&report, &report_path)?;
    print_summary(&report, &report_path, locale);

    if let Some(html) = &args.html {
        println!("{}", t!("generating_html", locale = locale, path = html.display()));
        if let Err(e) = generate_html_report(&report, html, locale) {
            eprintln!("{} {}", t!("html_failed", locale = locale).red(), e);
        }
    }
    if let Some(json) = &args.json {
        if let Err(e) = write_json_report(&report, json) {
            eprintln!("{} {}", t!("json_failed", locale = locale).red(), e);
        }
    }

    Ok(report)
}

/// Runs up to `jobs` test cases at a time. Results come back in dataset order
/// and are folded into the report by this task alone. Once the batch is
/// cancelled no further test case is started.
///
/// 每次最多运行 `jobs` 个测试用例。结果按数据集顺序返回，并且只由此任务合并到报告中。
/// 批次被取消后不再启动新的测试用例。
pub async fn run_cases(cases: Vec<TestCase>, jobs: usize, ctx: &RunContext) -> Report {
    let total = cases.len();
    let locale = ctx.locale.as_str();

    stream::iter(cases.into_iter().enumerate())
        .take_while(|_| {
            let cancelled = ctx.cancel.is_cancelled();
            async move { !cancelled }
        })
        .map(|(i, case)| async move {
            println!(
                "{}",
                t!("processing", locale = locale, index = i + 1, total = total, id = &case.id).bold()
            );
            let result = run_test_case(&case, ctx).await;
            println!();
            (case, result)
        })
        .buffered(jobs.max(1))
        .fold(Report::new(), |mut report, (case, result)| async move {
            report.record(&case, result);
            report
        })
        .await
}

fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("shutdown_signal", locale = &locale).yellow());
            token_clone.cancel();
        }
    });

    token
}
