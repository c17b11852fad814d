//! Settings for locating and fetching the agfapi binary.
//!
//! Sources, highest precedence first:
//! - Environment: `AGFAPI_HOME_DIR`, `AGFAPI_VERSION`, `AGFAPI_RELEASE_URL`
//! - Config file: `<home>/config.toml`
//! - Defaults
//!
//! The home directory decides where the config file lives, so it can only
//! come from the environment (or the default `~/.agfapi`).

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provision::cache::default_root;
use crate::provision::fetch::DEFAULT_RELEASE_URL;
use crate::provision::platform::ArtifactFormat;

/// Overrides the cache root.
pub const HOME_ENV: &str = "AGFAPI_HOME_DIR";

/// Pins the release to provision.
pub const VERSION_ENV: &str = "AGFAPI_VERSION";

/// Overrides the release download location.
pub const RELEASE_URL_ENV: &str = "AGFAPI_RELEASE_URL";

/// Name of the config file inside the home directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Error loading settings.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {}", path.display())]
    #[diagnostic(code(agfapi::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {}", path.display())]
    #[diagnostic(
        code(agfapi::config::parse),
        help("Valid keys are `version`, `release_url`, `artifact_format` and `progress`")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Cache root
    #[serde(skip)]
    pub home: PathBuf,

    /// Release to provision instead of the one matching this package
    pub version: Option<String>,

    /// Base URL of the release page
    pub release_url: String,

    /// How release assets package the binary
    pub artifact_format: ArtifactFormat,

    /// Show a progress bar while downloading
    pub progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            home: default_home(),
            version: None,
            release_url: DEFAULT_RELEASE_URL.to_string(),
            artifact_format: ArtifactFormat::Raw,
            progress: true,
        }
    }
}

impl Settings {
    /// Load settings from the process environment and the config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load settings, reading environment variables through `env`.
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let home = var(HOME_ENV).map(PathBuf::from).unwrap_or_else(default_home);

        let mut settings = Self::load_file(&home.join(CONFIG_FILE))?;
        settings.home = home;

        if let Some(version) = var(VERSION_ENV) {
            settings.version = Some(version);
        }
        if let Some(url) = var(RELEASE_URL_ENV) {
            settings.release_url = url;
        }

        Ok(settings)
    }

    /// Read a config file, falling back to defaults if it does not exist.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn default_home() -> PathBuf {
    default_root().unwrap_or_else(|| std::env::temp_dir().join("agfapi"))
}
