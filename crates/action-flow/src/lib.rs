//! Study-log workflow engine
//!
//! Runs the fixed portal sequence (login, navigation, hour selection,
//! comment, confirmation) against a [`cdp_adapter::PageSession`], recording
//! every step in an append-only [`StepLog`]. Any step failure triggers a
//! best-effort diagnostic screenshot followed by guaranteed session release.

pub mod contract;
pub mod diagnostics;
pub mod errors;
pub mod executor;
pub mod types;

pub use contract::UiContract;
pub use errors::{ErrorKind, FlowError};
pub use executor::{StudyLogWorkflow, WorkflowExecutor};
pub use types::{
    Credential, Hours, Outcome, Step, StepLog, StepMarker, StepPhase, StudyEntry, Subject,
    SubmissionRequest, WorkflowResult,
};
