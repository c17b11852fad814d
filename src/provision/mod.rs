//! Locating, downloading and caching the agfapi binary.
//!
//! [`BinaryProvisioner`] ties the pieces together:
//! version resolution, the on-disk cache (a present binary short-circuits
//! everything else), platform detection, download and installation.

pub mod cache;
pub mod errors;
pub mod extract;
pub mod fetch;
pub mod platform;
pub mod version;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::util::config::Settings;

pub use cache::CacheStore;
pub use errors::{DownloadError, InstallError, ProvisionError, TransportError};
pub use fetch::{HttpTransport, Transport};
pub use platform::{Arch, Artifact, ArtifactFormat, Os, PlatformKey};
pub use version::{PackageVersion, VersionSource, VersionTag};

/// Resolves a runnable agfapi binary, downloading it on a cache miss.
pub struct BinaryProvisioner {
    cache: CacheStore,
    release_url: String,
    format: ArtifactFormat,
    version_override: Option<String>,
    platform: Option<PlatformKey>,
    transport: Box<dyn Transport>,
    version_source: Box<dyn VersionSource>,
}

impl BinaryProvisioner {
    /// Create a provisioner caching under `cache_root`, using HTTP downloads
    /// and this package's version.
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        BinaryProvisioner {
            cache: CacheStore::new(absolute(cache_root.into())),
            release_url: fetch::DEFAULT_RELEASE_URL.to_string(),
            format: ArtifactFormat::Raw,
            version_override: None,
            platform: None,
            transport: Box::new(HttpTransport::new()),
            version_source: Box::new(PackageVersion),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        BinaryProvisioner::new(&settings.home)
            .with_release_url(&settings.release_url)
            .with_format(settings.artifact_format)
            .with_version(settings.version.clone())
            .with_transport(HttpTransport::new().with_progress(settings.progress))
    }

    pub fn with_release_url(mut self, url: impl Into<String>) -> Self {
        self.release_url = url.into();
        self
    }

    pub fn with_format(mut self, format: ArtifactFormat) -> Self {
        self.format = format;
        self
    }

    /// Pin the release instead of deriving it from the package version.
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version_override = version;
        self
    }

    /// Provision for `platform` instead of the host.
    pub fn with_platform(mut self, platform: PlatformKey) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    pub fn with_version_source(mut self, source: impl VersionSource + 'static) -> Self {
        self.version_source = Box::new(source);
        self
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// The release this provisioner targets.
    pub fn resolve_version(&self) -> Result<VersionTag, ProvisionError> {
        version::resolve(self.version_override.as_deref(), self.version_source.as_ref())
    }

    fn platform(&self) -> Result<PlatformKey, ProvisionError> {
        match self.platform {
            Some(platform) => Ok(platform),
            None => PlatformKey::detect(),
        }
    }

    /// Return the path of a ready-to-run binary, downloading it if the
    /// cache does not already hold one.
    ///
    /// A cached binary is trusted as-is; nothing beyond its presence is
    /// checked.
    pub fn provision(&self) -> Result<PathBuf, ProvisionError> {
        let version = self.resolve_version()?;
        let platform = self.platform()?;
        let artifact = platform.artifact(self.format);

        let dir = self.cache.locate(&version)?;
        let binary = self.cache.binary_path(&dir, &artifact.binary_name);
        if self.cache.exists(&binary) {
            debug!("Using cached agfapi {} at {}", version, binary.display());
            return Ok(binary);
        }

        let url = fetch::asset_url(&self.release_url, &version, &artifact)?;
        info!("Downloading agfapi binary ({}) for {}", version, platform);

        self.download(url.as_str(), &artifact, &dir)
            .map_err(|source| ProvisionError::Provisioning {
                version,
                platform,
                source,
            })
    }

    /// Discard any cached binary for the target release, then provision.
    pub fn reinstall(&self) -> Result<PathBuf, ProvisionError> {
        let version = self.resolve_version()?;
        if self.cache.remove(&version)? {
            info!("Removed cached agfapi {}", version);
        }
        self.provision()
    }

    fn download(&self, url: &str, artifact: &Artifact, dir: &Path) -> Result<PathBuf, InstallError> {
        let data = fetch::fetch(self.transport.as_ref(), url)?;
        let path = extract::install(&data, artifact, dir)?;
        info!("Installed {}", path.display());
        Ok(path)
    }
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path,
    }
}
