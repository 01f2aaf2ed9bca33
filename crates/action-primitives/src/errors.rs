//! Error types for action primitives

use cdp_adapter::{AdapterError, AdapterErrorKind};
use thiserror::Error;

/// Error types for field location, waiting and page interaction
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Navigation timed out waiting for page load
    #[error("Navigation timeout: {0}")]
    NavTimeout(String),

    /// Wait operation exceeded the session-level timeout
    #[error("Wait timeout: {0}")]
    WaitTimeout(String),

    /// No element matched the field description
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Dropdown option was not found
    #[error("Option not found in dropdown: {0}")]
    OptionNotFound(String),

    /// CDP communication or protocol error
    #[error("CDP I/O error: {0}")]
    CdpIo(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// True for failures caused by the page not reaching a state in time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ActionError::NavTimeout(_) | ActionError::WaitTimeout(_))
    }
}

impl From<AdapterError> for ActionError {
    fn from(err: AdapterError) -> Self {
        let message = err.to_string();
        match err.kind {
            AdapterErrorKind::NavTimeout => ActionError::NavTimeout(message),
            AdapterErrorKind::TargetNotFound => ActionError::FieldNotFound(message),
            AdapterErrorKind::OptionNotFound => ActionError::OptionNotFound(message),
            AdapterErrorKind::Internal => ActionError::Internal(message),
            AdapterErrorKind::Launch | AdapterErrorKind::CdpIo | AdapterErrorKind::Closed => {
                ActionError::CdpIo(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_kinds_map_onto_action_errors() {
        let err: ActionError = AdapterError::new(AdapterErrorKind::OptionNotFound)
            .with_hint("2: 1")
            .into();
        assert_eq!(
            err,
            ActionError::OptionNotFound("option not found: 2: 1".to_string())
        );

        let err: ActionError = AdapterError::new(AdapterErrorKind::NavTimeout).into();
        assert!(err.is_timeout());

        let err: ActionError = AdapterError::new(AdapterErrorKind::Closed).into();
        assert!(matches!(err, ActionError::CdpIo(_)));
    }
}
