use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;

/// Fill in the daily study record on the school portal.
///
/// Portal credentials come from `STUDYLOG_ID` and `STUDYLOG_PASSWORD` or the
/// `credentials` section of the config file.
#[derive(Parser)]
#[command(name = "studylog", version, propagate_version = true)]
pub struct CliArgs {
    /// YAML config; without it ./config/config.yaml, then the user config dir
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Filter level used when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(short, long, value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Commands {
    /// Subcommand name as typed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Run(_) => "run",
            Commands::Serve(_) => "serve",
        }
    }
}
