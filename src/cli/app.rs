use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_config};

/// Parse arguments, install logging, resolve config and hand off to the subcommand.
pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();
    init_logging(&cli.log_level, cli.debug)?;

    let command = cli.command.name();
    info!(command, version = env!("CARGO_PKG_VERSION"), "studylog starting");

    let mut config = load_config(cli.config.as_ref()).await?;
    config.apply_env_overrides();

    if let Err(err) = dispatch(&cli, config).await {
        error!(command, error = %err, "studylog {command} failed");
        return Err(err);
    }
    info!(command, "studylog {command} finished");
    Ok(())
}
