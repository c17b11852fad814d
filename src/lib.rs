//! agfapi - provisioning and invocation of the agfapi command-line client
//!
//! This crate downloads the platform-specific `agfapi` executable into a
//! per-version cache on first use, runs it as a subprocess with streamed
//! output, and decodes the JSON it prints for worklist lookups.

pub mod client;
pub mod error;
pub mod provision;
pub mod util;
pub mod worklist;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted HTTP transport, a fixed version
/// source and archive fixtures.
#[cfg(test)]
pub mod test_support;

pub use client::{Agfapi, FAILURE_EXIT_CODE};
pub use error::Error;
pub use provision::{BinaryProvisioner, PlatformKey, ProvisionError, VersionTag};
pub use util::config::Settings;
pub use util::process::{ExecError, OutputLines};
pub use worklist::{get_worklist, WorklistError};
