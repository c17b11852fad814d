//! On-disk binary cache.
//!
//! Layout: `<root>/bin/agfapi/<tag>/<binary name>`. A version directory holds
//! at most one binary; its presence is the only cache-hit signal.

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::ProvisionError;
use super::platform::TOOL_NAME;
use super::version::VersionTag;

/// Maps release tags to cache directories under a root.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CacheStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every cached version of the tool.
    pub fn tool_dir(&self) -> PathBuf {
        self.root.join("bin").join(TOOL_NAME)
    }

    /// Directory for `tag`, created if missing.
    pub fn locate(&self, tag: &VersionTag) -> Result<PathBuf, ProvisionError> {
        let dir = self.tool_dir().join(tag.as_str());
        fs::create_dir_all(&dir).map_err(|source| ProvisionError::Cache {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    pub fn binary_path(&self, dir: &Path, binary_name: &str) -> PathBuf {
        dir.join(binary_name)
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// Cached version tags, sorted.
    pub fn versions(&self) -> Result<Vec<String>, ProvisionError> {
        let dir = self.tool_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|source| ProvisionError::Cache {
            path: dir.clone(),
            source,
        })?;

        let mut versions: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        versions.sort();
        Ok(versions)
    }

    /// Remove the directory for `tag`. Returns whether anything was removed.
    pub fn remove(&self, tag: &VersionTag) -> Result<bool, ProvisionError> {
        let dir = self.tool_dir().join(tag.as_str());
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir).map_err(|source| ProvisionError::Cache {
            path: dir.clone(),
            source,
        })?;
        Ok(true)
    }

    /// Remove every cached version.
    pub fn clear(&self) -> Result<bool, ProvisionError> {
        let dir = self.tool_dir();
        if !dir.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir).map_err(|source| ProvisionError::Cache {
            path: dir.clone(),
            source,
        })?;
        Ok(true)
    }
}

/// Default cache root (`~/.agfapi`), or `None` without a home directory.
pub fn default_root() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".agfapi"))
}
