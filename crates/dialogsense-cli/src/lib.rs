//! dialogsense CLI
//!
//! Argument parsing and run orchestration for the `dialogsense` binary.

pub mod app;
pub mod cli;

pub use app::{run, RunSettings, RunSummary};
pub use cli::Cli;
