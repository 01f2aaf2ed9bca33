//! Select primitive - Pick an hour option from a dropdown

use crate::{
    errors::ActionError,
    primitives::DefaultActionPrimitives,
    types::{ActionReport, FieldSpec, HourOption},
};
use cdp_adapter::PageSession;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Execute select primitive
///
/// Steps:
/// 1. Resolve the dropdown via the locator
/// 2. Select the option whose value is `option.value()`
/// 3. Generate action report
pub async fn execute_select(
    primitives: &DefaultActionPrimitives,
    page: &dyn PageSession,
    field: &FieldSpec,
    option: HourOption,
) -> Result<ActionReport, ActionError> {
    let started_at = Utc::now();
    let start_instant = Instant::now();
    let value = option.value();

    debug!(session = %page.id(), field = %field, option = %value, "Executing select primitive");

    let element = primitives.resolve_field(page, field).await?;
    page.select_option(&element.selector, &value)
        .await
        .map_err(|err| {
            warn!(field = %field, option = %value, error = %err, "select failed");
            ActionError::from(err)
        })?;

    let latency_ms = start_instant.elapsed().as_millis() as u64;
    info!(field = %field, option = %value, latency_ms, "Select completed");

    Ok(ActionReport::new("select", started_at, latency_ms).with_selector(element.selector))
}
