//! The Gradle distribution layer, installed when the project has no wrapper.

use std::path::Path;

use gradlepack_config::BuildpackDependency;
use tracing::info;

use crate::dependency::DependencyCache;
use crate::error::EngineError;

/// Layer name of the installed distribution.
pub const LAYER_NAME: &str = "gradle";

/// A resolved Gradle distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub dependency: BuildpackDependency,
}

impl Distribution {
    pub fn new(dependency: BuildpackDependency) -> Self {
        Self { dependency }
    }

    /// Metadata recorded on the layer; any change to the dependency
    /// invalidates the installed copy.
    ///
    /// # Errors
    /// Returns an error if the dependency cannot be represented as TOML.
    pub fn metadata(&self) -> Result<toml::Table, EngineError> {
        match toml::Value::try_from(&self.dependency) {
            Ok(toml::Value::Table(table)) => Ok(table),
            Ok(_) => Err(EngineError::Metadata {
                path: LAYER_NAME.to_owned(),
                message: "dependency did not serialize to a table".to_owned(),
            }),
            Err(e) => Err(EngineError::Metadata {
                path: LAYER_NAME.to_owned(),
                message: e.to_string(),
            }),
        }
    }

    /// Path of the `gradle` launcher inside a layer rooted at `layer_path`.
    pub fn executable(layer_path: &Path) -> std::path::PathBuf {
        layer_path.join("bin").join("gradle")
    }

    /// Fetch the distribution and expand it into `layer_path`.
    ///
    /// # Errors
    /// Returns an error if the artifact cannot be fetched or extracted.
    pub fn install(&self, layer_path: &Path, cache: &dyn DependencyCache) -> Result<(), EngineError> {
        info!(
            id = %self.dependency.id,
            version = %self.dependency.version,
            "installing distribution"
        );
        let artifact = cache.artifact(&self.dependency)?;
        gradlepack_util::archive::extract_tar_gz(&artifact, layer_path, 1)?;

        let launcher = Self::executable(layer_path);
        if gradlepack_util::fs::exists(&launcher)? {
            gradlepack_util::fs::make_executable(&launcher)?;
        }
        Ok(())
    }
}
