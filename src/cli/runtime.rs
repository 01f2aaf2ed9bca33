use std::path::PathBuf;
use std::sync::Arc;

use action_flow::{StudyLogWorkflow, UiContract};
use action_primitives::{
    DefaultActionPrimitives, DefaultWaitStrategy, FieldLocator, ScriptFieldLocator,
};
use anyhow::{Context, Result};
use cdp_adapter::ChromiumProvider;
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<AppConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => {
            // Priority: ./config/config.yaml > ~/.config/studylog/config.yaml
            let local_config = PathBuf::from("config/config.yaml");
            if local_config.exists() {
                local_config
            } else {
                let mut path = dirs::config_dir().context("Failed to get config directory")?;
                path.push("studylog");
                path.push("config.yaml");
                path
            }
        }
    };

    if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .context("Failed to read config file")?;

        let config: AppConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        Ok(AppConfig::default())
    }
}

/// Wire the Chromium provider, the script locator and the configured wait
/// bounds into a workflow.
pub fn build_workflow(config: &AppConfig) -> StudyLogWorkflow {
    let timing = &config.timing;
    let locator: Arc<dyn FieldLocator> = Arc::new(ScriptFieldLocator::new());
    let wait_strategy = DefaultWaitStrategy::new(Arc::clone(&locator))
        .with_timeouts(timing.wait_timeout_ms, timing.network_quiet_ms)
        .with_poll_interval(timing.poll_interval_ms);
    let primitives = DefaultActionPrimitives::new(locator, Arc::new(wait_strategy))
        .with_locate_timeout(timing.wait_timeout_ms, timing.poll_interval_ms);
    let provider = ChromiumProvider::new(config.browser.clone());

    StudyLogWorkflow::new(Arc::new(provider), Arc::new(primitives))
        .with_contract(UiContract::v1().with_settle_delay(timing.settle_delay()))
}
