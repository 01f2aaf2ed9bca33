//! Action primitives for the study-log workflow
//!
//! This crate provides the building blocks the workflow engine composes:
//! - Field location by role, accessible name, container text or CSS
//! - The synchronization policy (network settled, element visible, fixed delay)
//! - Page primitives: navigate, click, type, select, wait, screenshot

pub mod errors;
mod locator;
mod primitives;
pub mod types;
mod waiting;

#[cfg(test)]
mod test_support;

pub use errors::*;
pub use locator::*;
pub use primitives::*;
pub use types::*;
pub use waiting::*;
