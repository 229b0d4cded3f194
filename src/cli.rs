// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{
    env,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

use crate::commands::{self, extract::ExtractArgs, run::RunArgs};
use crate::core::config::{RunnerConfig, DEFAULT_PREFIX, DEFAULT_TIMEOUT_SECS};
use crate::infra::t;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
fn pre_parse_language() -> Option<String> {
    language_from_args(env::args_os())
}

/// Looks for a `--lang <VALUE>` argument, then a `language` key in the
/// config file given with `-c/--config`. Arguments are compared as `OsStr`,
/// so non-UTF-8 arguments such as dataset paths are tolerated.
pub fn language_from_args(args: impl IntoIterator<Item = OsString>) -> Option<String> {
    let args: Vec<OsString> = args.into_iter().collect();
    let value_of = |names: &[&str]| {
        args.iter()
            .position(|arg| names.iter().any(|name| arg.as_os_str() == OsStr::new(name)))
            .and_then(|pos| args.get(pos + 1))
    };
    if let Some(lang) = value_of(&["--lang"]) {
        return lang.to_str().map(str::to_string);
    }
    value_of(&["-c", "--config"])
        .and_then(|path| RunnerConfig::load(Path::new(path)).ok())
        .and_then(|config| config.language)
}

fn dataset_arg(locale: &str) -> Arg {
    Arg::new("file")
        .short('f')
        .long("file")
        .help(t!("arg_file", locale = locale).to_string())
        .value_name("DATASET")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn id_arg(locale: &str) -> Arg {
    Arg::new("id")
        .short('i')
        .long("id")
        .help(t!("arg_id", locale = locale).to_string())
        .value_name("ID")
        .action(ArgAction::Set)
}

fn prefix_arg(locale: &str) -> Arg {
    Arg::new("prefix")
        .short('p')
        .long("prefix")
        .help(t!("arg_prefix", locale = locale, default = DEFAULT_PREFIX).to_string())
        .value_name("DIR")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn config_arg(locale: &str) -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help(t!("arg_config", locale = locale).to_string())
        .value_name("CONFIG")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("direct-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(dataset_arg(locale))
                .arg(id_arg(locale))
                .arg(prefix_arg(locale))
                .arg(
                    Arg::new("timeout")
                        .short('t')
                        .long("timeout")
                        .help(t!("arg_timeout", locale = locale, default = DEFAULT_TIMEOUT_SECS).to_string())
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help(t!("arg_jobs", locale = locale).to_string())
                        .value_name("JOBS")
                        .value_parser(clap::value_parser!(usize))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("category")
                        .long("category")
                        .help(t!("arg_category", locale = locale).to_string())
                        .value_name("CATEGORY")
                        .action(ArgAction::Append),
                )
                .arg(config_arg(locale))
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("arg_html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help(t!("arg_json", locale = locale).to_string())
                        .value_name("JSON")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("extract")
                .about(t!("cmd_extract_about", locale = locale).to_string())
                .arg(dataset_arg(locale))
                .arg(id_arg(locale))
                .arg(prefix_arg(locale))
                .arg(config_arg(locale)),
        )
}

fn run_args(matches: &ArgMatches) -> RunArgs {
    RunArgs {
        dataset: matches
            .get_one::<PathBuf>("file")
            .cloned()
            .unwrap_or_default(), // Required by clap
        id: matches.get_one::<String>("id").cloned(),
        categories: matches
            .get_many::<String>("category")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        prefix: matches.get_one::<PathBuf>("prefix").cloned(),
        timeout_secs: matches.get_one::<u64>("timeout").copied(),
        jobs: matches.get_one::<usize>("jobs").copied(),
        config: matches.get_one::<PathBuf>("config").cloned(),
        html: matches.get_one::<PathBuf>("html").cloned(),
        json: matches.get_one::<PathBuf>("json").cloned(),
    }
}

fn extract_args(matches: &ArgMatches) -> ExtractArgs {
    ExtractArgs {
        dataset: matches
            .get_one::<PathBuf>("file")
            .cloned()
            .unwrap_or_default(), // Required by clap
        id: matches.get_one::<String>("id").cloned(),
        prefix: matches.get_one::<PathBuf>("prefix").cloned(),
        config: matches.get_one::<PathBuf>("config").cloned(),
    }
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let language = crate::init(pre_parse_language().as_deref());

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            commands::run::execute(run_args(run_matches), &language).await?;
        }
        Some(("extract", extract_matches)) => {
            commands::extract::execute(extract_args(extract_matches), &language)?;
        }
        _ => {
            // `subcommand_required` makes clap print help and exit before this.
        }
    }
    Ok(())
}
