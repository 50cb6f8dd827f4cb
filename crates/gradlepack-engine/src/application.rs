//! The application layer: the Gradle invocation and everything that keys it.

use std::path::PathBuf;

use gradlepack_config::resolver::{BUILT_ARTIFACT, BUILT_MODULE};
use gradlepack_config::ConfigurationResolver;

use crate::cache::CacheKey;

/// Layer name of the built application.
pub const LAYER_NAME: &str = "application";

/// Fallback when no artifact glob is configured at all.
const DEFAULT_ARTIFACT: &str = "build/libs/*.[jw]ar";

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub command: PathBuf,
    pub arguments: Vec<String>,
    /// Extra metadata, e.g. bound properties fingerprints.
    pub fingerprints: toml::Table,
    pub artifact_pattern: String,
}

impl Application {
    /// Metadata recorded on the layer. Arguments, command, artifact pattern
    /// and fingerprints all participate in the cache key.
    pub fn metadata(&self) -> toml::Table {
        let mut metadata = self.fingerprints.clone();
        metadata.insert(
            "arguments".to_owned(),
            toml::Value::Array(
                self.arguments
                    .iter()
                    .map(|a| toml::Value::String(a.clone()))
                    .collect(),
            ),
        );
        metadata.insert(
            "command".to_owned(),
            toml::Value::String(self.command.display().to_string()),
        );
        metadata.insert(
            "artifact-pattern".to_owned(),
            toml::Value::String(self.artifact_pattern.clone()),
        );
        metadata
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::compute(&self.metadata())
    }
}

/// Glob of the built artifact, prefixed by the built module when one is set.
pub fn artifact_pattern(config: &ConfigurationResolver) -> String {
    let artifact = config.resolve(BUILT_ARTIFACT).unwrap_or(DEFAULT_ARTIFACT);
    match config.resolve(BUILT_MODULE) {
        Some(module) => format!("{}/{artifact}", module.trim_end_matches('/')),
        None => artifact.to_owned(),
    }
}
