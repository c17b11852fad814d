//! Test fixtures: in-memory release archives and stand-in binaries.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

/// Build a gzip-compressed tar archive from `(path, contents)` pairs.
pub fn tar_gz_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut data, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (path, contents) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_path(path).unwrap();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, *contents).unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap();
    }
    data
}

/// Build a zip archive from `(path, contents)` pairs. Paths ending in `/`
/// become directory entries.
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for (path, contents) in entries {
            if path.ends_with('/') {
                zip.add_directory(*path, options).unwrap();
            } else {
                zip.start_file(*path, options).unwrap();
                zip.write_all(contents).unwrap();
            }
        }

        zip.finish().unwrap();
    }
    cursor.into_inner()
}

/// Write an executable shell script named `name` into `dir`.
#[cfg(unix)]
pub fn fake_binary(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    crate::provision::extract::make_executable(&path).unwrap();
    path
}
