//! Workflow error types

use action_primitives::ActionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure category carried by a failed [`crate::WorkflowResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    /// No browser session could be provisioned
    SessionAcquisition,
    /// A required control was absent from the page
    FieldNotFound { spec: String },
    /// A readiness wait or navigation exceeded its bound
    Timeout,
    /// Input rejected before any browser work
    Validation,
    /// A browser command failed outright
    Browser,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::SessionAcquisition => write!(f, "session_acquisition"),
            ErrorKind::FieldNotFound { .. } => write!(f, "field_not_found"),
            ErrorKind::Timeout => write!(f, "timeout"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Browser => write!(f, "browser"),
        }
    }
}

/// Workflow errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Submission input is invalid
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Session provider could not start a browser
    #[error("Session acquisition failed: {0}")]
    SessionAcquisition(String),

    /// Locator found no matching control
    #[error("Field not found: {spec}")]
    FieldNotFound { spec: String },

    /// Wait bound exceeded
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Browser command error
    #[error("Browser command failed: {0}")]
    Browser(String),
}

impl FlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::Validation(_) => ErrorKind::Validation,
            FlowError::SessionAcquisition(_) => ErrorKind::SessionAcquisition,
            FlowError::FieldNotFound { spec } => ErrorKind::FieldNotFound { spec: spec.clone() },
            FlowError::Timeout(_) => ErrorKind::Timeout,
            FlowError::Browser(_) => ErrorKind::Browser,
        }
    }
}

impl From<ActionError> for FlowError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::FieldNotFound(spec) => FlowError::FieldNotFound { spec },
            // The dropdown exists but the hour value does not: the control for
            // that value is missing.
            ActionError::OptionNotFound(option) => FlowError::FieldNotFound { spec: option },
            ActionError::NavTimeout(msg) | ActionError::WaitTimeout(msg) => FlowError::Timeout(msg),
            ActionError::CdpIo(msg) | ActionError::Internal(msg) => FlowError::Browser(msg),
        }
    }
}
