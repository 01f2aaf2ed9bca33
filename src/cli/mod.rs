pub mod app;
mod commands;
mod dispatch;
mod env;
pub mod run;
pub mod runtime;
pub mod serve;

pub use env::CliArgs;
