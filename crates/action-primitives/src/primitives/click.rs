//! Click primitive - Click a located field

use crate::{
    errors::ActionError,
    primitives::DefaultActionPrimitives,
    types::{ActionReport, FieldSpec},
};
use cdp_adapter::PageSession;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info};

/// Execute click primitive
///
/// Steps:
/// 1. Resolve the field via the locator
/// 2. Dispatch the click on the resolved selector
/// 3. Generate action report
pub async fn execute_click(
    primitives: &DefaultActionPrimitives,
    page: &dyn PageSession,
    field: &FieldSpec,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    debug!(session = %page.id(), field = %field, "Executing click primitive");

    let element = primitives.resolve_field(page, field).await?;
    page.click(&element.selector).await?;

    let latency_ms = start_instant.elapsed().as_millis() as u64;
    info!(field = %field, latency_ms, "Click completed");

    Ok(ActionReport::new("click", started_at, latency_ms).with_selector(element.selector))
}
