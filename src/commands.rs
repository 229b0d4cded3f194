//! Subcommand implementations behind the CLI.

pub mod extract;
pub mod run;
