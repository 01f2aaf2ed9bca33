//! Wait primitive - Apply a readiness condition through the wait strategy

use crate::{
    errors::ActionError,
    primitives::DefaultActionPrimitives,
    types::{ActionReport, WaitKind},
};
use cdp_adapter::PageSession;
use chrono::Utc;
use std::time::Instant;
use tracing::debug;

pub async fn execute_wait(
    primitives: &DefaultActionPrimitives,
    page: &dyn PageSession,
    kind: &WaitKind,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    primitives.wait_strategy().wait(page, kind).await?;

    let latency_ms = start_instant.elapsed().as_millis() as u64;
    debug!(session = %page.id(), condition = %kind, latency_ms, "Wait satisfied");

    Ok(ActionReport::new("wait", started_at, latency_ms))
}
