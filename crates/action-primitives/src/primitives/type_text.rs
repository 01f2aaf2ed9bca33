//! Type text primitive - Replace the value of a text field

use crate::{
    errors::ActionError,
    primitives::DefaultActionPrimitives,
    types::{ActionReport, FieldSpec},
};
use cdp_adapter::PageSession;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info};

/// Execute type_text primitive
///
/// Locates the field, then fills it with `text`. An empty `text` clears the
/// field. The text itself is never logged since it may be a secret.
pub async fn execute_type_text(
    primitives: &DefaultActionPrimitives,
    page: &dyn PageSession,
    field: &FieldSpec,
    text: &str,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();

    debug!(
        session = %page.id(),
        field = %field,
        chars = text.chars().count(),
        "Executing type_text primitive"
    );

    let element = primitives.resolve_field(page, field).await?;
    page.fill(&element.selector, text).await?;

    let latency_ms = start_instant.elapsed().as_millis() as u64;
    info!(field = %field, latency_ms, "Type text completed");

    Ok(ActionReport::new("type_text", started_at, latency_ms).with_selector(element.selector))
}
