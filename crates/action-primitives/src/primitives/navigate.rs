//! Navigate primitive - Load a URL in the session's page

use crate::{errors::ActionError, types::ActionReport};
use cdp_adapter::PageSession;
use chrono::Utc;
use std::time::Instant;
use tracing::info;

/// Execute navigate primitive
///
/// Readiness after navigation is left to the caller's wait policy.
pub async fn execute_navigate(
    page: &dyn PageSession,
    url: &str,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    if url.trim().is_empty() {
        return Err(ActionError::Internal("URL cannot be empty".to_string()));
    }

    info!(session = %page.id(), url = %url, "Executing navigate primitive");
    page.navigate(url).await?;

    let latency_ms = start_instant.elapsed().as_millis() as u64;
    info!(url = %url, latency_ms, "Navigation completed");

    Ok(ActionReport::new("navigate", started_at, latency_ms))
}
