//! HTTP surface: entry form, form and JSON submission, health.

pub mod render;
mod router;
mod state;

pub use router::build_router;
pub use state::ServeState;
