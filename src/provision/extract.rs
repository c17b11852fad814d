//! Installing a downloaded artifact into the cache.
//!
//! Raw artifacts are written as-is. Archives are scanned for the first entry
//! named after the binary, either at the archive root or below a directory.
//! In every case the binary is staged in a temporary file next to its final
//! location and renamed into place once it is executable, so a concurrent
//! reader never sees a partial file at the cache path.

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tempfile::NamedTempFile;
use tracing::debug;

use super::errors::InstallError;
use super::platform::{Artifact, ArtifactFormat};

/// Install the binary carried by `data` into `dest_dir`.
///
/// Returns the path of the installed executable,
/// `dest_dir/<artifact.binary_name>`.
pub fn install(data: &[u8], artifact: &Artifact, dest_dir: &Path) -> Result<PathBuf, InstallError> {
    let dest = dest_dir.join(&artifact.binary_name);

    match artifact.format {
        ArtifactFormat::Raw => write_binary(&mut Cursor::new(data), &dest)?,
        ArtifactFormat::TarGz => extract_tar_gz(data, artifact, &dest)?,
        ArtifactFormat::Zip => extract_zip(data, artifact, &dest)?,
    }

    debug!("Installed {} to {}", artifact.name, dest.display());
    Ok(dest)
}

/// Whether an archive entry path names the binary.
fn entry_matches(entry_name: &str, binary_name: &str) -> bool {
    let normalized = entry_name.replace('\\', "/");
    normalized == binary_name || normalized.ends_with(&format!("/{}", binary_name))
}

fn extract_tar_gz(data: &[u8], artifact: &Artifact, dest: &Path) -> Result<(), InstallError> {
    let extract_err = |source: io::Error| InstallError::Extract {
        archive: artifact.name.clone(),
        source,
    };

    let decoder = GzDecoder::new(Cursor::new(data));
    let mut archive = tar::Archive::new(decoder);

    for entry in archive.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry
            .path()
            .map_err(extract_err)?
            .to_string_lossy()
            .into_owned();

        if entry_matches(&name, &artifact.binary_name) {
            debug!("Found {} in {}", name, artifact.name);
            return write_binary(&mut entry, dest);
        }
    }

    Err(InstallError::BinaryNotFoundInArchive {
        binary: artifact.binary_name.clone(),
        archive: artifact.name.clone(),
    })
}

fn extract_zip(data: &[u8], artifact: &Artifact, dest: &Path) -> Result<(), InstallError> {
    let extract_err = |source: io::Error| InstallError::Extract {
        archive: artifact.name.clone(),
        source,
    };

    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| extract_err(io::Error::other(e)))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| extract_err(io::Error::other(e)))?;
        if entry.is_dir() {
            continue;
        }

        if entry_matches(entry.name(), &artifact.binary_name) {
            debug!("Found {} in {}", entry.name(), artifact.name);
            return write_binary(&mut entry, dest);
        }
    }

    Err(InstallError::BinaryNotFoundInArchive {
        binary: artifact.binary_name.clone(),
        archive: artifact.name.clone(),
    })
}

/// Stage `reader` next to `dest`, mark it executable and rename it into place.
fn write_binary(reader: &mut dyn Read, dest: &Path) -> Result<(), InstallError> {
    let write_err = |source: io::Error| InstallError::Write {
        path: dest.to_path_buf(),
        source,
    };

    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = NamedTempFile::new_in(dir).map_err(write_err)?;
    io::copy(reader, staged.as_file_mut()).map_err(write_err)?;
    staged.as_file().sync_all().map_err(write_err)?;

    make_executable(staged.path()).map_err(write_err)?;

    staged.persist(dest).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Add the executable bits to `path`. A no-op on Windows.
#[allow(unused_variables)]
pub fn make_executable(path: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mut permissions = fs::metadata(path)?.permissions();
        permissions.set_mode(permissions.mode() | 0o755);
        fs::set_permissions(path, permissions)?;
    }

    Ok(())
}
