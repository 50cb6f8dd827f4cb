//! Content-addressed cache keys for layer metadata.

use std::fmt;

/// A SHA-256 digest over a layer's metadata, used to decide reuse.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Compute a key from layer metadata.
    ///
    /// Entries are hashed in key order, so insertion order never matters.
    pub fn compute(metadata: &toml::Table) -> Self {
        let mut entries: Vec<(&String, String)> =
            metadata.iter().map(|(k, v)| (k, v.to_string())).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut parts: Vec<&str> = Vec::with_capacity(entries.len() * 2);
        for (key, value) in &entries {
            parts.push(key);
            parts.push(value);
        }

        Self(gradlepack_util::hash::sha256_multi(&parts))
    }

    /// Return the hex string representation of this cache key.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
