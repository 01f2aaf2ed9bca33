use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::runtime::build_workflow;
use crate::config::AppConfig;
use crate::server::{build_router, ServeState};

#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides config and STUDYLOG_BIND)
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// Attach to an existing Chrome DevTools websocket instead of launching
    #[arg(long)]
    pub ws_url: Option<String>,
}

pub async fn cmd_serve(args: ServeArgs, mut config: AppConfig) -> Result<()> {
    if let Some(ws) = args.ws_url.clone() {
        config.browser.websocket_url = Some(ws);
    }
    let addr = args.bind.unwrap_or(config.server.bind);

    let credential = config.credentials.credential();
    if credential.is_none() {
        warn!("No credentials configured; submissions will be rejected with 401");
    }

    let workflow = build_workflow(&config);
    let state = ServeState::new(Arc::new(workflow), credential);
    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind server on {}", addr))?;
    info!("Entry form available at http://{}", addr);
    if let Some(ws) = config.browser.websocket_url.as_deref() {
        info!("Using external DevTools endpoint: {}", ws);
    } else {
        info!("Using local Chrome detection (STUDYLOG_CHROME / auto-detect)");
    }

    axum::serve(listener, router.into_make_service())
        .await
        .context("server exited unexpectedly")?;
    Ok(())
}
