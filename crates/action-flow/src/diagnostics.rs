//! Best-effort failure capture and session teardown.
//!
//! Nothing here fails: errors are logged, noted in the step log and dropped so
//! the original workflow error is what the caller sees.

use cdp_adapter::PageSession;
use tracing::{info, warn};

use crate::types::{Step, StepLog};

/// One screenshot attempt of the page as it was when the run failed.
pub async fn capture_on_failure(
    page: Option<&dyn PageSession>,
    log: &mut StepLog,
) -> Option<Vec<u8>> {
    let page = page?;
    match page.screenshot().await {
        Ok(png) => {
            log.note(Step::Diagnostics, "diagnostic screenshot captured");
            Some(png)
        }
        Err(err) => {
            warn!(session = %page.id(), error = %err, "diagnostic screenshot failed");
            log.note(
                Step::Diagnostics,
                format!("diagnostic screenshot failed: {err}"),
            );
            None
        }
    }
}

/// Close the session if one was acquired. Consumes it so it cannot be closed twice.
pub async fn close_if_present(session: Option<Box<dyn PageSession>>, log: &mut StepLog) {
    let Some(session) = session else {
        return;
    };

    match session.close().await {
        Ok(()) => {
            info!(session = %session.id(), "session released");
            log.note(Step::ReleaseSession, "session released");
        }
        Err(err) => {
            warn!(session = %session.id(), error = %err, "session close failed");
            log.note(Step::ReleaseSession, format!("session close failed: {err}"));
        }
    }
}
