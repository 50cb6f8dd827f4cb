//! The `~/.gradle` cache layer.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::EngineError;
use crate::layer::Layer;

/// Layer name of the Gradle user-home cache.
pub const LAYER_NAME: &str = "cache";

/// Gradle's user home, backed by a cached layer between builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeCache {
    pub path: PathBuf,
}

impl HomeCache {
    /// The cache rooted at `<home>/.gradle`.
    pub fn for_home(home: &Path) -> Self {
        Self {
            path: home.join(".gradle"),
        }
    }

    /// Point [`Self::path`] at `layer`'s directory.
    ///
    /// Entries of a pre-existing real directory, such as a reconciled
    /// `gradle.properties`, are moved into the layer first.
    ///
    /// # Errors
    /// Returns an error if the existing entries cannot be moved or the link
    /// cannot be created.
    pub fn link(&self, layer: &Layer) -> Result<(), EngineError> {
        match std::fs::symlink_metadata(&self.path) {
            Ok(meta) if meta.is_dir() => {
                debug!(path = %self.path.display(), "moving existing gradle home into cache layer");
                gradlepack_util::fs::move_dir_contents(&self.path, &layer.path)?;
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent() {
                    gradlepack_util::fs::ensure_dir(parent)?;
                }
            }
            Err(source) => {
                return Err(EngineError::Io {
                    action: "stat",
                    path: self.path.display().to_string(),
                    source,
                })
            }
        }

        gradlepack_util::fs::replace_symlink(&layer.path, &self.path)?;
        debug!(link = %self.path.display(), target = %layer.path.display(), "linked cache");
        Ok(())
    }
}
