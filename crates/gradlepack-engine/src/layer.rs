//! On-disk layers: `<layers>/<name>/` plus `<layers>/<name>.toml`.
//!
//! A layer whose stored metadata matches the expected metadata is reused
//! as-is; otherwise its directory is reset and contributed again.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::build::BuildResult;
use crate::cache::CacheKey;
use crate::dependency::DependencyCache;
use crate::error::EngineError;

/// Where a layer is visible and whether it survives between builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerTypes {
    #[serde(default)]
    pub build: bool,
    #[serde(default)]
    pub cache: bool,
    #[serde(default)]
    pub launch: bool,
}

/// A named layer directory and its persisted description.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub path: PathBuf,
    pub types: LayerTypes,
    pub metadata: toml::Table,
}

impl Layer {
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::compute(&self.metadata)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LayerFile {
    #[serde(default)]
    types: LayerTypes,
    #[serde(default)]
    metadata: toml::Table,
}

/// The layers directory handed to the build.
#[derive(Debug, Clone)]
pub struct Layers {
    pub root: PathBuf,
}

impl Layers {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn descriptor_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.toml"))
    }

    /// Load a layer as left by the previous build, or an empty one.
    ///
    /// # Errors
    /// Returns an error if an existing descriptor cannot be read or parsed.
    pub fn layer(&self, name: &str) -> Result<Layer, EngineError> {
        let descriptor = self.descriptor_path(name);
        let file = match std::fs::read_to_string(&descriptor) {
            Ok(content) => toml::from_str(&content).map_err(|e| EngineError::Metadata {
                path: descriptor.display().to_string(),
                message: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LayerFile::default(),
            Err(source) => {
                return Err(EngineError::Io {
                    action: "read",
                    path: descriptor.display().to_string(),
                    source,
                })
            }
        };

        Ok(Layer {
            name: name.to_owned(),
            path: self.root.join(name),
            types: file.types,
            metadata: file.metadata,
        })
    }

    /// Persist a layer's types and metadata.
    ///
    /// # Errors
    /// Returns an error if the descriptor cannot be serialized or written.
    pub fn write(&self, layer: &Layer) -> Result<(), EngineError> {
        let descriptor = self.descriptor_path(&layer.name);
        let content = toml::to_string_pretty(&LayerFile {
            types: layer.types,
            metadata: layer.metadata.clone(),
        })
        .map_err(|e| EngineError::Metadata {
            path: descriptor.display().to_string(),
            message: e.to_string(),
        })?;
        gradlepack_util::fs::write_replacing(&descriptor, content.as_bytes())?;
        Ok(())
    }
}

/// Contribute every layer of `result` in order and persist its descriptor.
///
/// # Errors
/// Returns an error if any layer cannot be read, installed, or written.
pub fn contribute_all(
    layers: &Layers,
    result: &BuildResult,
    cache: &dyn DependencyCache,
) -> Result<Vec<Layer>, EngineError> {
    gradlepack_util::fs::ensure_dir(&layers.root)?;

    let mut contributed = Vec::with_capacity(result.layers.len());
    for build_layer in &result.layers {
        let mut layer = layers.layer(build_layer.name())?;
        let expected = build_layer.metadata()?;

        if layer.metadata == expected && gradlepack_util::fs::exists(&layer.path)? {
            info!(layer = %layer.name, key = %layer.cache_key(), "reusing cached layer");
        } else {
            info!(layer = %layer.name, "contributing layer");
            reset_dir(&layer.path)?;
            build_layer.install(&layer.path, cache)?;
            layer.metadata = expected;
        }

        build_layer.link(&layer)?;
        layer.types = build_layer.types();
        layers.write(&layer)?;
        contributed.push(layer);
    }
    Ok(contributed)
}

fn reset_dir(path: &Path) -> Result<(), EngineError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(EngineError::Io {
                action: "remove",
                path: path.display().to_string(),
                source,
            })
        }
    }
    gradlepack_util::fs::ensure_dir(path)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn missing_descriptor_is_empty_layer() {
        let tmp = tempfile::tempdir().unwrap();
        let layers = Layers::new(tmp.path());

        let layer = layers.layer("gradle").unwrap();

        assert_eq!(layer.path, tmp.path().join("gradle"));
        assert_eq!(layer.types, LayerTypes::default());
        assert!(layer.metadata.is_empty());
    }

    #[test]
    fn write_then_read_keeps_types_and_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let layers = Layers::new(tmp.path());

        let mut metadata = toml::Table::new();
        metadata.insert("version".to_owned(), toml::Value::String("8.5.0".to_owned()));
        let layer = Layer {
            name: "gradle".to_owned(),
            path: tmp.path().join("gradle"),
            types: LayerTypes {
                build: false,
                cache: true,
                launch: false,
            },
            metadata,
        };
        layers.write(&layer).unwrap();

        let content = fs::read_to_string(tmp.path().join("gradle.toml")).unwrap();
        assert!(content.contains("[types]"));
        assert!(content.contains("[metadata]"));
        assert_eq!(layers.layer("gradle").unwrap(), layer);
    }

    #[test]
    fn corrupt_descriptor_names_path() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("cache.toml"), "[types\n").unwrap();

        let err = Layers::new(tmp.path()).layer("cache").unwrap_err();
        assert!(err.to_string().contains("cache.toml"));
    }

    #[test]
    fn reset_dir_clears_previous_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("layer");
        fs::create_dir_all(dir.join("bin")).unwrap();
        fs::write(dir.join("bin").join("stale"), "x").unwrap();

        reset_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }
}
