//! Release asset download.
//!
//! Downloads are attempted once with certificate verification. If, and only
//! if, that attempt fails verification, a single retry is made without it.

use std::error::Error as StdError;
use std::io::{IsTerminal, Read};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};
use url::Url;

use super::errors::{DownloadError, ProvisionError, TransportError};
use super::platform::Artifact;
use super::version::VersionTag;

/// Upper bound on the buffer reserved from a `Content-Length` header.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Substrings of TLS library messages that mean verification failed.
const CERTIFICATE_MARKERS: &[&str] = &[
    "certificate",
    "handshake",
    "self signed",
    "self-signed",
    "unknown issuer",
    "unknownissuer",
];

/// Default location of agfapi releases.
pub const DEFAULT_RELEASE_URL: &str = "https://github.com/s-hammon/agfapi/releases";

/// A blocking HTTP GET.
pub trait Transport: Send + Sync {
    /// Fetch `url` into memory. `verify_certificates` is false only on the
    /// insecure retry.
    fn get(&self, url: &str, verify_certificates: bool) -> Result<Vec<u8>, TransportError>;
}

/// [`Transport`] backed by `reqwest`'s blocking client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    progress: bool,
}

impl HttpTransport {
    pub fn new() -> Self {
        HttpTransport::default()
    }

    /// Draw a progress bar on stderr while downloading, if it is a terminal.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.progress || !std::io::stderr().is_terminal() {
            return ProgressBar::hidden();
        }

        match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                {
                    bar.set_style(style.progress_chars("=> "));
                }
                bar.set_message("Downloading");
                bar
            }
            None => {
                let bar = ProgressBar::new_spinner();
                bar.set_message("Downloading");
                bar
            }
        }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, verify_certificates: bool) -> Result<Vec<u8>, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(!verify_certificates)
            .user_agent(concat!("agfapi-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| classify(e, url))?;

        let mut response = client.get(url).send().map_err(|e| classify(e, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total = response.content_length();
        debug!("Content-Length: {:?}", total);

        let bar = self.progress_bar(total);
        let reserve = total.map_or(0, |len| len.min(MAX_PREALLOCATION));
        let mut data = Vec::with_capacity(usize::try_from(reserve).unwrap_or(0));
        let read = bar.wrap_read(&mut response).read_to_end(&mut data);
        bar.finish_and_clear();
        read.map_err(|e| TransportError::Other(Box::new(e)))?;

        Ok(data)
    }
}

/// Sort a `reqwest` failure into certificate and other errors.
///
/// Only the causes are inspected: the top-level message embeds the request
/// URL, which says nothing about why the request failed.
fn classify(err: reqwest::Error, url: &str) -> TransportError {
    match err.source() {
        Some(cause) if is_certificate_error(cause, url) => {
            TransportError::Certificate(error_chain(&err))
        }
        _ => TransportError::Other(Box::new(err)),
    }
}

/// Whether any error in the chain starting at `err` reports a failed
/// certificate check. Occurrences of `url` and its host are ignored.
fn is_certificate_error(err: &(dyn StdError + 'static), url: &str) -> bool {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    let mut current = Some(err);
    while let Some(e) = current {
        let mut message = e.to_string().replace(url, "");
        if let Some(host) = host.as_deref() {
            message = message.replace(host, "");
        }
        let message = message.to_ascii_lowercase();
        if CERTIFICATE_MARKERS.iter().any(|m| message.contains(m)) {
            return true;
        }
        current = e.source();
    }
    false
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        parts.push(e.to_string());
        current = e.source();
    }
    parts.join(": ")
}

/// Download `url`, retrying once without certificate verification if the
/// first attempt fails verification.
pub fn fetch(transport: &dyn Transport, url: &str) -> Result<Vec<u8>, DownloadError> {
    debug!("GET {}", url);

    match transport.get(url, true) {
        Ok(data) => Ok(data),
        Err(err) if err.is_certificate() => {
            warn!(
                "certificate verification failed ({}); retrying without verification",
                err
            );
            transport
                .get(url, false)
                .map_err(|source| DownloadError {
                    url: url.to_string(),
                    insecure_retry: true,
                    source,
                })
        }
        Err(source) => Err(DownloadError {
            url: url.to_string(),
            insecure_retry: false,
            source,
        }),
    }
}

/// Release asset URL for `tag`.
///
/// `latest` uses the `latest/download` alias; any other tag uses its own
/// `download/<tag>` path.
pub fn asset_url(
    release_url: &str,
    tag: &VersionTag,
    artifact: &Artifact,
) -> Result<Url, ProvisionError> {
    let base = release_url.trim_end_matches('/');
    let raw = if tag.is_latest() {
        format!("{}/latest/download/{}", base, artifact.name)
    } else {
        format!("{}/download/{}/{}", base, tag, artifact.name)
    };

    Url::parse(&raw).map_err(|source| ProvisionError::InvalidReleaseUrl {
        url: release_url.to_string(),
        source,
    })
}
