//! Error types for gradlepack-util.

/// Errors produced by utility functions.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    /// A filesystem operation failed.
    #[error("cannot {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        source: std::io::Error,
    },

    /// A symbolic link could not be created.
    #[error("cannot symlink {link} -> {target}: {source}")]
    Symlink {
        link: String,
        target: String,
        source: std::io::Error,
    },

    /// A properties file contains an invalid escape sequence.
    #[error("invalid properties content at line {line}: {message}")]
    Properties { line: usize, message: String },

    /// A download failed.
    #[error("download of {url} failed: {message}")]
    Download { url: String, message: String },

    /// A downloaded artifact does not match its expected digest.
    #[error("artifact hash mismatch for {path} — expected {expected}, got {actual}")]
    HashMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// An archive could not be extracted.
    #[error("cannot extract {path}: {message}")]
    Extract { path: String, message: String },

    /// An archive entry attempted to escape the extraction directory.
    #[error("archive contains path traversal entry \"{entry_path}\" that escapes {dest}")]
    PathTraversal { entry_path: String, dest: String },

    /// Cannot determine the user's home directory.
    #[error("cannot determine home directory — set the HOME environment variable")]
    NoHomeDir,
}

impl UtilError {
    /// Wrap an I/O error with the attempted action and the path it touched.
    pub fn io(action: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }
}
