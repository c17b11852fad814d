//! Resolution of the agfapi release to provision.
//!
//! Order of precedence:
//! 1. An explicit override (`AGFAPI_VERSION`), used as given
//! 2. The version of this package, unless it is a development build
//! 3. `latest`
//!
//! The result is always normalized to carry a leading `v` unless it is
//! `latest`.

use std::fmt;

use anyhow::Result;

use super::errors::ProvisionError;

/// Sentinel tag selecting the newest published release.
pub const LATEST: &str = "latest";

/// A normalized release identifier, either `latest` or a `v`-prefixed tag.
///
/// Tags name a cache directory and a URL path segment, so they are limited
/// to ASCII alphanumerics and `.`, `-`, `_`, `+`, and never contain `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionTag(String);

impl VersionTag {
    /// Normalize a raw version string into a tag.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ProvisionError> {
        let raw = raw.as_ref().trim();
        if raw.is_empty() || raw == LATEST {
            return Ok(VersionTag::latest());
        }

        let valid = raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+'))
            && !raw.contains("..");
        if !valid {
            return Err(ProvisionError::InvalidVersion {
                tag: raw.to_string(),
            });
        }

        if raw.starts_with('v') {
            Ok(VersionTag(raw.to_string()))
        } else {
            Ok(VersionTag(format!("v{}", raw)))
        }
    }

    pub fn latest() -> Self {
        VersionTag(LATEST.to_string())
    }

    pub fn is_latest(&self) -> bool {
        self.0 == LATEST
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supplies the version of the installed client package.
pub trait VersionSource: Send + Sync {
    fn installed_version(&self) -> Result<String>;
}

/// The version this crate was built as.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageVersion;

impl VersionSource for PackageVersion {
    fn installed_version(&self) -> Result<String> {
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }
}

/// Resolve the tag to provision.
///
/// A malformed override is an error; a malformed installed version falls
/// back to `latest` like any other failure to read it.
pub fn resolve(
    version_override: Option<&str>,
    source: &dyn VersionSource,
) -> std::result::Result<VersionTag, ProvisionError> {
    if let Some(explicit) = version_override.filter(|v| !v.trim().is_empty()) {
        return VersionTag::new(explicit);
    }

    let installed = source
        .installed_version()
        .and_then(|v| VersionTag::new(release_for_installed(&v)).map_err(Into::into));
    match installed {
        Ok(tag) => Ok(tag),
        Err(e) => {
            tracing::debug!("could not determine installed version: {:#}", e);
            Ok(VersionTag::latest())
        }
    }
}

/// Map an installed package version onto the release it should use.
fn release_for_installed(installed: &str) -> &str {
    let installed = installed.trim();
    if installed.contains("dev") || installed == "0.0.0" {
        return LATEST;
    }

    match installed.find(".post") {
        Some(idx) => &installed[..idx],
        None => installed,
    }
}
