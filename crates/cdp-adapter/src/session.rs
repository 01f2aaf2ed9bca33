//! Page-level session seam consumed by the locator, wait and workflow layers.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AdapterError;
use crate::ids::SessionId;
use crate::network::NetworkSnapshot;

/// A controllable rendered page plus its navigation and interaction surface.
///
/// Selectors passed to the interaction methods are plain CSS selectors; the
/// locator layer is responsible for turning logical fields into selectors.
#[async_trait]
pub trait PageSession: Send + Sync {
    fn id(&self) -> SessionId;

    async fn navigate(&self, url: &str) -> Result<(), AdapterError>;

    /// Evaluate a JavaScript expression in the page and return its JSON value.
    async fn evaluate(&self, expression: &str) -> Result<Value, AdapterError>;

    async fn click(&self, selector: &str) -> Result<(), AdapterError>;

    /// Replace the current value of a text control with `text`.
    async fn fill(&self, selector: &str, text: &str) -> Result<(), AdapterError>;

    /// Select the `<option>` whose value equals `value`.
    async fn select_option(&self, selector: &str, value: &str) -> Result<(), AdapterError>;

    async fn network_snapshot(&self) -> Result<NetworkSnapshot, AdapterError>;

    /// Capture a PNG of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, AdapterError>;

    /// Tear the browser down. Calling it twice yields `AdapterErrorKind::Closed`.
    async fn close(&self) -> Result<(), AdapterError>;
}

/// Provisions one fresh, exclusively owned session per call.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn PageSession>, AdapterError>;
}
