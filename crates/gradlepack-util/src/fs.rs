//! Filesystem utilities for gradlepack.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::UtilError;

/// Create a directory and all parent directories if they do not exist.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<(), UtilError> {
    std::fs::create_dir_all(path).map_err(|source| UtilError::io("create directory", path, source))
}

/// Report whether `path` exists, following symlinks.
///
/// A missing file is `Ok(false)`; any other stat failure is an error.
///
/// # Errors
/// Returns an error if the path cannot be stat'ed for a reason other than
/// absence (e.g. permission denied on a parent directory).
pub fn exists(path: &Path) -> Result<bool, UtilError> {
    match std::fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(UtilError::io("stat", path, source)),
    }
}

/// Remove a file or symlink. No error if nothing is there.
///
/// # Errors
/// Returns an error if the path exists but cannot be removed.
pub fn remove_file_if_exists(path: &Path) -> Result<(), UtilError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(UtilError::io("remove", path, source)),
    }
}

/// Create a symlink at `link` pointing at `target`, replacing whatever
/// file or link already occupies `link`.
///
/// # Errors
/// Returns an error if the stale entry cannot be removed or the link cannot
/// be created.
pub fn replace_symlink(target: &Path, link: &Path) -> Result<(), UtilError> {
    match symlink(target, link) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            std::fs::remove_file(link).map_err(|source| UtilError::io("remove", link, source))?;
            symlink(target, link).map_err(|source| symlink_error(target, link, source))
        }
        Err(source) => Err(symlink_error(target, link, source)),
    }
}

fn symlink_error(target: &Path, link: &Path, source: std::io::Error) -> UtilError {
    UtilError::Symlink {
        link: link.display().to_string(),
        target: target.display().to_string(),
        source,
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(_target: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        ErrorKind::Unsupported,
        "symlinks are only supported on unix hosts",
    ))
}

/// Set `rwxr-xr-x` on `path`.
///
/// # Errors
/// Returns an error if the permissions cannot be changed.
pub fn make_executable(path: &Path) -> Result<(), UtilError> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .map_err(|source| UtilError::io("chmod", path, source))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Write `content` to `path` via a sibling temp file and rename.
///
/// # Errors
/// Returns an error if the temp file cannot be written or renamed over `path`.
pub fn write_replacing(path: &Path, content: &[u8]) -> Result<(), UtilError> {
    let mut tmp_name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, content).map_err(|source| UtilError::io("write", &tmp_path, source))?;
    std::fs::rename(&tmp_path, path).map_err(|source| UtilError::io("replace", path, source))
}

/// Move every entry of directory `from` into `to`, replacing same-named
/// entries in `to`, then remove `from`.
///
/// # Errors
/// Returns an error if either directory cannot be read or an entry cannot be
/// moved.
pub fn move_dir_contents(from: &Path, to: &Path) -> Result<(), UtilError> {
    ensure_dir(to)?;
    let entries = std::fs::read_dir(from).map_err(|source| UtilError::io("read", from, source))?;
    for entry in entries {
        let entry = entry.map_err(|source| UtilError::io("read", from, source))?;
        let dest = to.join(entry.file_name());
        if let Ok(meta) = std::fs::symlink_metadata(&dest) {
            if meta.is_dir() {
                std::fs::remove_dir_all(&dest)
                    .map_err(|source| UtilError::io("remove", &dest, source))?;
            } else {
                std::fs::remove_file(&dest).map_err(|source| UtilError::io("remove", &dest, source))?;
            }
        }
        std::fs::rename(entry.path(), &dest)
            .map_err(|source| UtilError::io("move", &entry.path(), source))?;
    }
    std::fs::remove_dir(from).map_err(|source| UtilError::io("remove", from, source))
}

/// Return the current user's home directory.
///
/// Resolves via `HOME` (Unix) or `USERPROFILE` (Windows).
///
/// # Errors
/// Returns an error if neither environment variable is set.
pub fn home_dir() -> Result<PathBuf, UtilError> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .map_err(|_| UtilError::NoHomeDir)
}
