//! Provisioning error types.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use super::platform::PlatformKey;
use super::version::VersionTag;

/// Error while locating or installing the agfapi binary.
#[derive(Debug, Error, Diagnostic)]
pub enum ProvisionError {
    #[error("unsupported platform: {os} {arch}")]
    #[diagnostic(
        code(agfapi::provision::unsupported_platform),
        help("agfapi releases are published for linux and windows on x86_64 and arm64")
    )]
    UnsupportedPlatform { os: String, arch: String },

    #[error("failed to prepare cache directory: {}", path.display())]
    #[diagnostic(
        code(agfapi::provision::cache),
        help("Set AGFAPI_HOME_DIR to a writable directory")
    )]
    Cache {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid version `{tag}`")]
    #[diagnostic(
        code(agfapi::provision::invalid_version),
        help("Versions look like `1.2.3`, `v1.2.3` or `latest`")
    )]
    InvalidVersion { tag: String },

    #[error("invalid release url `{url}`")]
    #[diagnostic(code(agfapi::provision::release_url))]
    InvalidReleaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("could not provision agfapi {version} for {platform}: {source}")]
    #[diagnostic(
        code(agfapi::provision::failed),
        help("Check your network connection, or pin a published release with AGFAPI_VERSION")
    )]
    Provisioning {
        version: VersionTag,
        platform: PlatformKey,
        #[source]
        source: InstallError,
    },

    #[error("agfapi provisioning already failed in this process: {message}")]
    #[diagnostic(code(agfapi::provision::previously_failed))]
    PreviouslyFailed { message: String },

    #[error("agfapi binary is already initialized for this process")]
    #[diagnostic(code(agfapi::provision::already_initialized))]
    AlreadyInitialized,
}

/// Failure while fetching or unpacking a release asset.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("binary `{binary}` not found in archive `{archive}`")]
    BinaryNotFoundInArchive { binary: String, archive: String },

    #[error("failed to extract archive `{archive}`")]
    Extract {
        archive: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write binary: {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A download that failed after all permitted attempts.
#[derive(Debug, Error)]
#[error("failed to download {url}{}", if *insecure_retry { " (also without certificate verification)" } else { "" })]
pub struct DownloadError {
    pub url: String,

    /// Whether an unverified retry was attempted
    pub insecure_retry: bool,

    #[source]
    pub source: TransportError,
}

/// A single failed HTTP attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("certificate verification failed: {0}")]
    Certificate(String),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Whether this failure warrants a retry without certificate checks.
    pub fn is_certificate(&self) -> bool {
        matches!(self, TransportError::Certificate(_))
    }
}
