//! # Extract Command Module / 提取命令模块
//!
//! Materializes test cases without running them and prints what a manual run
//! would use. No toolchain is required.
//!
//! 物化测试用例但不运行，并打印手动运行所需的设置。不需要工具链。

use anyhow::Result;
use colored::*;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::RunnerConfig,
        dataset::Dataset,
        environment::{resolve_environment, AmbientEnvironment, MODULE, SIM, TOPLEVEL, VERILOG_SOURCES},
        execution::{build_invocation, prepare_test_dir, RunContext},
        planner,
    },
    infra::t,
};

#[derive(Debug, Clone, Default)]
pub struct ExtractArgs {
    pub dataset: PathBuf,
    pub id: Option<String>,
    pub prefix: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Executes the `extract` command.
///
/// Unlike `run`, a materialization failure here is fatal: nothing else would
/// be reported for that test case.
pub fn execute(args: ExtractArgs, locale: &str) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };
    if let Some(prefix) = &args.prefix {
        config.prefix = prefix.to_string_lossy().into_owned();
    }

    let dataset = Dataset::open(&args.dataset)?.with_env_file(config.env_file.clone());
    let cases = match &args.id {
        Some(id) => vec![dataset.find(id)?],
        None => dataset.load_all()?,
    };
    let plan = planner::plan_execution(cases, None, &[])?;

    let prefix = PathBuf::from(&config.prefix);
    let ctx = RunContext::new(
        config,
        AmbientEnvironment::capture(),
        prefix,
        CancellationToken::new(),
        locale,
    );

    for case in &plan.cases_to_run {
        println!("{}", t!("extract.test_id", locale = locale, id = &case.id).bold());
        if !case.categories.is_empty() {
            let categories = case.categories.iter().cloned().collect::<Vec<_>>().join(", ");
            println!("{}", t!("extract.categories", locale = locale, list = categories));
        }

        let dir = prepare_test_dir(case, &ctx)?;
        let env = resolve_environment(case, &dir.root, &ctx.ambient, &ctx.policy)?;

        println!("{}", t!("extract.settings", locale = locale).cyan());
        for key in [SIM, TOPLEVEL, MODULE, VERILOG_SOURCES] {
            println!("    {key}={}", env.get(key).unwrap_or_default());
        }
        println!(
            "    {}={}",
            ctx.config.search_path_var,
            env.get(&ctx.config.search_path_var).unwrap_or_default()
        );

        let argv = build_invocation(&ctx.config, &dir, &env)?;
        println!("{}", t!("extract.manual_run", locale = locale).cyan());
        println!("    cd {}", dir.run_dir().display());
        println!("    {}", shlex::try_join(argv.iter().map(String::as_str))?);
        println!();
    }

    println!(
        "{}",
        t!("extract.done", locale = locale, count = plan.cases_to_run.len()).green()
    );
    Ok(())
}
