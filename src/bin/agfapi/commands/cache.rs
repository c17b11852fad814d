//! `agfapi self cache` command
//!
//! Lists and removes cached agfapi binaries.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::{CacheArgs, CacheCleanArgs, CacheCommands};
use agfapi::provision::CacheStore;
use agfapi::{Settings, VersionTag};

pub fn execute(args: CacheArgs, settings: &Settings) -> Result<()> {
    let cache = CacheStore::new(&settings.home);
    match args.command {
        CacheCommands::List => list_cache(&cache),
        CacheCommands::Clean(clean_args) => clean_cache(&cache, clean_args),
    }
}

/// List cached versions with their sizes.
fn list_cache(cache: &CacheStore) -> Result<()> {
    let tool_dir = cache.tool_dir();
    println!("Cache directory: {}", tool_dir.display());
    println!();

    let versions = cache.versions()?;
    if versions.is_empty() {
        println!("  (none)");
        return Ok(());
    }

    for version in versions {
        let size = dir_size(&tool_dir.join(&version))?;
        println!("  {} ({})", version, format_size(size));
    }

    Ok(())
}

fn clean_cache(cache: &CacheStore, args: CacheCleanArgs) -> Result<()> {
    let removed = match &args.version {
        Some(version) => {
            let tag = VersionTag::new(version)?;
            let removed = cache.remove(&tag)?;
            if removed {
                eprintln!("     Removed agfapi {}", tag);
            }
            removed
        }
        None => {
            let removed = cache.clear()?;
            if removed {
                eprintln!("     Removed {}", cache.tool_dir().display());
            }
            removed
        }
    };

    if !removed {
        eprintln!("     Nothing to clean");
    }

    Ok(())
}

/// Total size of the files directly inside `dir`.
fn dir_size(dir: &Path) -> Result<u64> {
    let mut size = 0;
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read: {}", dir.display()))? {
        let entry = entry?;
        if entry.path().is_file() {
            size += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }
    Ok(size)
}

/// Format a size in bytes to a human-readable string.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
