//! Study-log autofill
//!
//! Exposes the CLI, configuration, input parsing and the HTTP surface built
//! on top of the `action-flow` workflow engine.

pub mod cli;
pub mod config;
pub mod errors;
pub mod input;
pub mod server;

pub use config::AppConfig;
pub use errors::AppError;
