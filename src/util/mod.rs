//! Shared utilities

pub mod config;
pub mod process;

pub use config::Settings;
pub use process::{ExecError, OutputLines, ProcessBuilder};
