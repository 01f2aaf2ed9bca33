//! Action primitives implementation
//!
//! Five primitives drive the study-log form:
//! 1. navigate - Load a URL in the session's page
//! 2. click - Click a located field
//! 3. type_text - Replace a text field's value
//! 4. select - Pick an hour option from a dropdown
//! 5. wait - Apply a readiness condition

mod click;
mod navigate;
mod select;
mod type_text;
mod wait;

pub use click::*;
pub use navigate::*;
pub use select::*;
pub use type_text::*;
pub use wait::*;

use async_trait::async_trait;
use cdp_adapter::PageSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::{
    errors::ActionError,
    locator::{FieldLocator, ScriptFieldLocator},
    types::{ActionReport, ElementHandle, FieldSpec, HourOption, WaitKind},
    waiting::{DefaultWaitStrategy, WaitStrategy},
};

/// Action primitives trait
///
/// Each primitive resolves its target through the configured locator,
/// performs a single page command and returns a timing report.
#[async_trait]
pub trait ActionPrimitives: Send + Sync {
    async fn navigate(&self, page: &dyn PageSession, url: &str)
        -> Result<ActionReport, ActionError>;

    async fn click(
        &self,
        page: &dyn PageSession,
        field: &FieldSpec,
    ) -> Result<ActionReport, ActionError>;

    /// Focus the field and replace its value with `text`
    async fn type_text(
        &self,
        page: &dyn PageSession,
        field: &FieldSpec,
        text: &str,
    ) -> Result<ActionReport, ActionError>;

    async fn select(
        &self,
        page: &dyn PageSession,
        field: &FieldSpec,
        option: HourOption,
    ) -> Result<ActionReport, ActionError>;

    async fn wait_for(
        &self,
        page: &dyn PageSession,
        kind: &WaitKind,
    ) -> Result<ActionReport, ActionError>;

    /// Capture a PNG of the current viewport
    async fn screenshot(&self, page: &dyn PageSession) -> Result<Vec<u8>, ActionError>;
}

/// Default implementation of action primitives
pub struct DefaultActionPrimitives {
    /// Resolves logical fields into page selectors
    locator: Arc<dyn FieldLocator>,

    /// Readiness policy used by `wait_for`
    wait_strategy: Arc<dyn WaitStrategy>,

    /// How long a target may take to attach before `FieldNotFound` (milliseconds)
    pub locate_timeout_ms: u64,

    /// Delay between lookups while the target is missing (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for DefaultActionPrimitives {
    fn default() -> Self {
        let locator: Arc<dyn FieldLocator> = Arc::new(ScriptFieldLocator::default());
        let wait_strategy = Arc::new(DefaultWaitStrategy::new(locator.clone()));
        Self::new(locator, wait_strategy)
    }
}

impl DefaultActionPrimitives {
    pub fn new(locator: Arc<dyn FieldLocator>, wait_strategy: Arc<dyn WaitStrategy>) -> Self {
        Self {
            locator,
            wait_strategy,
            locate_timeout_ms: 30_000,
            poll_interval_ms: 100,
        }
    }

    pub fn with_locate_timeout(mut self, timeout_ms: u64, poll_interval_ms: u64) -> Self {
        self.locate_timeout_ms = timeout_ms;
        self.poll_interval_ms = poll_interval_ms.max(1);
        self
    }

    pub fn locator(&self) -> &Arc<dyn FieldLocator> {
        &self.locator
    }

    pub fn wait_strategy(&self) -> &Arc<dyn WaitStrategy> {
        &self.wait_strategy
    }

    /// Resolve a field into an addressable element, polling until it attaches.
    ///
    /// The page may still be swapping documents after the previous action, so
    /// a miss is retried until `locate_timeout_ms` has elapsed. The lookup runs
    /// at least once even with a zero bound.
    pub async fn resolve_field(
        &self,
        page: &dyn PageSession,
        field: &FieldSpec,
    ) -> Result<ElementHandle, ActionError> {
        let deadline = Instant::now() + Duration::from_millis(self.locate_timeout_ms);
        let poll = Duration::from_millis(self.poll_interval_ms.max(1));

        loop {
            if let Some(hit) = self.locator.probe(page, field).await? {
                return Ok(hit.handle);
            }
            if Instant::now() >= deadline {
                warn!(field = %field, timeout_ms = self.locate_timeout_ms, "field never attached");
                return Err(ActionError::FieldNotFound(field.to_string()));
            }
            debug!(field = %field, "field not attached yet, retrying");
            sleep(poll).await;
        }
    }
}

#[async_trait]
impl ActionPrimitives for DefaultActionPrimitives {
    async fn navigate(
        &self,
        page: &dyn PageSession,
        url: &str,
    ) -> Result<ActionReport, ActionError> {
        navigate::execute_navigate(page, url).await
    }

    async fn click(
        &self,
        page: &dyn PageSession,
        field: &FieldSpec,
    ) -> Result<ActionReport, ActionError> {
        click::execute_click(self, page, field).await
    }

    async fn type_text(
        &self,
        page: &dyn PageSession,
        field: &FieldSpec,
        text: &str,
    ) -> Result<ActionReport, ActionError> {
        type_text::execute_type_text(self, page, field, text).await
    }

    async fn select(
        &self,
        page: &dyn PageSession,
        field: &FieldSpec,
        option: HourOption,
    ) -> Result<ActionReport, ActionError> {
        select::execute_select(self, page, field, option).await
    }

    async fn wait_for(
        &self,
        page: &dyn PageSession,
        kind: &WaitKind,
    ) -> Result<ActionReport, ActionError> {
        wait::execute_wait(self, page, kind).await
    }

    async fn screenshot(&self, page: &dyn PageSession) -> Result<Vec<u8>, ActionError> {
        Ok(page.screenshot().await?)
    }
}
