//! Extraction of `.tar.gz` distribution archives.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::UtilError;

/// Extract a gzip-compressed tarball into `dest`, dropping the first
/// `strip_components` path components of every entry.
///
/// Entries whose path is consumed entirely by stripping are skipped.
///
/// # Errors
/// Returns an error if the archive cannot be read, an entry tries to escape
/// `dest`, or an entry cannot be written.
pub fn extract_tar_gz(tarball: &Path, dest: &Path, strip_components: usize) -> Result<(), UtilError> {
    debug!(archive = %tarball.display(), dest = %dest.display(), "extracting");

    crate::fs::ensure_dir(dest)?;
    let canonical_dest = std::fs::canonicalize(dest)
        .map_err(|source| UtilError::io("canonicalize", dest, source))?;

    let file =
        std::fs::File::open(tarball).map_err(|source| UtilError::io("open", tarball, source))?;
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(file));

    let extract_err = |e: std::io::Error| UtilError::Extract {
        path: tarball.display().to_string(),
        message: e.to_string(),
    };

    for entry in archive.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        let entry_path = entry.path().map_err(extract_err)?.into_owned();

        if entry_path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(UtilError::PathTraversal {
                entry_path: entry_path.display().to_string(),
                dest: canonical_dest.display().to_string(),
            });
        }

        let relative: PathBuf = entry_path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .skip(strip_components)
            .collect();
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = canonical_dest.join(&relative);
        if !target.starts_with(&canonical_dest) {
            return Err(UtilError::PathTraversal {
                entry_path: entry_path.display().to_string(),
                dest: canonical_dest.display().to_string(),
            });
        }

        if let Some(parent) = target.parent() {
            crate::fs::ensure_dir(parent)?;
        }
        entry.unpack(&target).map_err(extract_err)?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    fn tarball(entries: &[(&str, &[u8])]) -> tempfile::NamedTempFile {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let gz = flate2::write::GzEncoder::new(tmp.reopen().unwrap(), flate2::Compression::fast());
        let mut builder = tar::Builder::new(gz);
        for &(path, content) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o755);
            header.set_entry_type(tar::EntryType::Regular);
            // Write the raw name so `..` survives; `set_path` would reject it.
            header
                .as_old_mut()
                .name
                .get_mut(..path.len())
                .unwrap()
                .copy_from_slice(path.as_bytes());
            header.set_cksum();
            builder.append(&header, content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
        tmp
    }

    #[test]
    fn strips_leading_directory() {
        let archive = tarball(&[
            ("gradle-8.5/bin/gradle", b"#!/bin/sh"),
            ("gradle-8.5/lib/gradle-launcher.jar", b"jar"),
        ]);
        let dest = tempfile::tempdir().unwrap();

        extract_tar_gz(archive.path(), dest.path(), 1).unwrap();

        assert_eq!(fs::read(dest.path().join("bin").join("gradle")).unwrap(), b"#!/bin/sh");
        assert!(dest.path().join("lib").join("gradle-launcher.jar").exists());
        assert!(!dest.path().join("gradle-8.5").exists());
    }

    #[test]
    fn keeps_paths_without_stripping() {
        let archive = tarball(&[("subdir/hello.txt", b"hello")]);
        let dest = tempfile::tempdir().unwrap();

        extract_tar_gz(archive.path(), dest.path(), 0).unwrap();

        assert!(dest.path().join("subdir").join("hello.txt").exists());
    }

    #[test]
    fn rejects_parent_dir_traversal() {
        let archive = tarball(&[("../../etc/evil.txt", b"pwned")]);
        let dest = tempfile::tempdir().unwrap();

        let err = extract_tar_gz(archive.path(), dest.path(), 0).unwrap_err();
        assert!(
            err.to_string().contains("path traversal"),
            "expected path traversal error, got: {err}"
        );
    }

    #[test]
    fn missing_archive_names_path() {
        let dest = tempfile::tempdir().unwrap();
        let err = extract_tar_gz(Path::new("/nonexistent/gradle.tgz"), dest.path(), 1).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/gradle.tgz"));
    }
}
