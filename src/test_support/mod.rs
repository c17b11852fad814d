//! Test utilities and mocks for unit tests.
//!
//! Provides a scripted HTTP transport and a fixed version source so the
//! provisioning pipeline can be tested without network access, plus
//! fixture builders for release archives and stand-in binaries.
//!
//! # Example
//!
//! ```rust,ignore
//! use agfapi::test_support::{MockTransport, StaticVersion};
//!
//! let transport = MockTransport::new().respond(Ok(b"binary".to_vec()));
//! let prov = BinaryProvisioner::new(tmp.path())
//!     .with_transport(transport.clone())
//!     .with_version_source(StaticVersion::ok("1.0.0"));
//! prov.provision()?;
//! assert_eq!(transport.attempts(), vec![true]);
//! ```

pub mod fixtures;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::provision::{Transport, TransportError, VersionSource};

// Re-export fixtures for convenience
pub use fixtures::*;

/// A recorded request made through [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub verify_certificates: bool,
}

#[derive(Debug, Default)]
struct TransportState {
    responses: VecDeque<Result<Vec<u8>, TransportError>>,
    requests: Vec<RecordedRequest>,
}

/// Scripted [`Transport`] that replays queued responses in order.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect the recorded requests through another.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<TransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Queue the outcome of the next request.
    pub fn respond(self, response: Result<Vec<u8>, TransportError>) -> Self {
        self.state.lock().unwrap().responses.push_back(response);
        self
    }

    /// Every request made so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    /// The certificate verification flag of each request, in order.
    pub fn attempts(&self) -> Vec<bool> {
        self.requests()
            .into_iter()
            .map(|r| r.verify_certificates)
            .collect()
    }

    /// The URL of each request, in order.
    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str, verify_certificates: bool) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(RecordedRequest {
            url: url.to_string(),
            verify_certificates,
        });
        state.responses.pop_front().unwrap_or_else(|| {
            Err(TransportError::Other(
                format!("no response queued for {}", url).into(),
            ))
        })
    }
}

/// [`VersionSource`] returning a fixed version or a fixed failure.
#[derive(Debug, Clone)]
pub struct StaticVersion(std::result::Result<String, String>);

impl StaticVersion {
    pub fn ok(version: impl Into<String>) -> Self {
        StaticVersion(Ok(version.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        StaticVersion(Err(message.into()))
    }
}

impl VersionSource for StaticVersion {
    fn installed_version(&self) -> Result<String> {
        self.0.clone().map_err(|e| anyhow!(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transport_replays_in_order() {
        let transport = MockTransport::new()
            .respond(Ok(b"one".to_vec()))
            .respond(Err(TransportError::Certificate("bad".into())));

        assert_eq!(transport.get("a", true).unwrap(), b"one");
        assert!(transport.get("b", false).unwrap_err().is_certificate());
        assert!(transport.get("c", true).is_err());

        assert_eq!(transport.urls(), vec!["a", "b", "c"]);
        assert_eq!(transport.attempts(), vec![true, false, true]);
    }

    #[test]
    fn test_static_version() {
        assert_eq!(StaticVersion::ok("1.0.0").installed_version().unwrap(), "1.0.0");
        assert!(StaticVersion::failing("nope").installed_version().is_err());
    }
}
