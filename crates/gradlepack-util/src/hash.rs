//! Hashing utilities for content fingerprints and cache keys.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::UtilError;

/// Compute the SHA-256 hex digest of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 hex digest of a file using streaming reads.
///
/// Uses a 64 KiB buffer so distribution archives are never loaded whole.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String, UtilError> {
    let file = std::fs::File::open(path).map_err(|source| UtilError::io("open", path, source))?;
    let mut reader = std::io::BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = std::io::Read::read(&mut reader, &mut buf)
            .map_err(|source| UtilError::io("read", path, source))?;
        if n == 0 {
            break;
        }
        let Some(chunk) = buf.get(..n) else {
            break;
        };
        hasher.update(chunk);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Combine multiple string parts into a single composite SHA-256 hash.
///
/// Each part is hashed in order with a length prefix to prevent ambiguity.
pub fn sha256_multi(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        // ["ab","c"] and ["a","bc"] must not collide.
        hasher.update(part.len().to_le_bytes());
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn sha256_bytes_known_digest() {
        assert_eq!(
            sha256_bytes(b"gradle-properties-content"),
            "6621087fb513e8db5544d34ccad59720793a1a5a9eb20a2df554422b8b5e50e5"
        );
    }

    #[test]
    fn sha256_bytes_empty() {
        assert_eq!(
            sha256_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_file_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("gradle-wrapper.properties");
        fs::write(&file, b"gradle-wrapper-properties-content").unwrap();

        assert_eq!(
            sha256_file(&file).unwrap(),
            "8d98502ceb9504c887b12cfba9427c5338d133a2f10613cb0137695ca09c7ddc"
        );
    }

    #[test]
    fn sha256_file_missing_names_path() {
        let err = sha256_file(Path::new("/nonexistent/gradle.properties")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cannot open"));
        assert!(msg.contains("/nonexistent/gradle.properties"));
    }

    #[test]
    fn sha256_multi_order_matters() {
        assert_ne!(
            sha256_multi(&["--no-daemon", "assemble"]),
            sha256_multi(&["assemble", "--no-daemon"])
        );
    }

    #[test]
    fn sha256_multi_no_boundary_collision() {
        assert_ne!(sha256_multi(&["ab", "c"]), sha256_multi(&["a", "bc"]));
    }
}
