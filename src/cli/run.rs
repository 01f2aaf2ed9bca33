use std::path::PathBuf;

use action_flow::WorkflowExecutor;
use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;

use super::runtime::build_workflow;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::input;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Hours per subject as SUBJECT=HOURS, e.g. 国語=2 (repeatable, in form order)
    #[arg(short, long = "entry", value_name = "SUBJECT=HOURS", required = true)]
    pub entries: Vec<String>,

    /// Free-text comment for the day
    #[arg(long, default_value = "")]
    pub comment: String,

    /// Where to write the confirmation screenshot
    #[arg(short, long, default_value = "studylog-confirmation.png")]
    pub output: PathBuf,

    /// Where to write the diagnostic screenshot if the run fails
    #[arg(long, default_value = "studylog-diagnostic.png")]
    pub diagnostic_output: PathBuf,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Attach to an existing Chrome DevTools websocket instead of launching
    #[arg(long)]
    pub ws_url: Option<String>,
}

pub async fn cmd_run(args: RunArgs, mut config: AppConfig) -> Result<()> {
    if args.headful {
        config.browser.headless = false;
    }
    if let Some(ws) = args.ws_url.clone() {
        config.browser.websocket_url = Some(ws);
    }

    let credential = config
        .credentials
        .credential()
        .ok_or(AppError::MissingCredentials)?;
    let request = input::from_entry_args(&args.entries, &args.comment)?;

    let workflow = build_workflow(&config);
    let result = workflow.execute(&credential, &request).await;

    println!("run {}", result.run_id);
    for marker in result.log.markers() {
        println!("  {marker}");
    }

    if let Some(png) = result.confirmation_image() {
        tokio::fs::write(&args.output, png)
            .await
            .with_context(|| format!("failed to write {}", args.output.display()))?;
        info!(path = %args.output.display(), "confirmation screenshot saved");
        println!("{}", crate::server::render::SUCCESS_HEADLINE);
        return Ok(());
    }

    if let Some(png) = result.diagnostic_image() {
        tokio::fs::write(&args.diagnostic_output, png)
            .await
            .with_context(|| format!("failed to write {}", args.diagnostic_output.display()))?;
        println!(
            "diagnostic screenshot: {}",
            args.diagnostic_output.display()
        );
    }

    let kind = result
        .error_kind()
        .map(|kind| kind.to_string())
        .unwrap_or_default();
    bail!(
        "workflow failed ({kind}): {}",
        result.error_message().unwrap_or("unknown failure")
    )
}
