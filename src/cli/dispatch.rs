use super::commands::Commands;
use super::env::CliArgs;
use super::run::cmd_run;
use super::serve::cmd_serve;
use crate::config::AppConfig;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, config: AppConfig) -> Result<()> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, config).await,
        Commands::Serve(args) => cmd_serve(args, config).await,
    }
}
