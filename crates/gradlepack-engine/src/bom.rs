//! Bill-of-materials entries for installed dependencies.

use std::path::Path;

use gradlepack_config::BuildpackDependency;
use serde::Serialize;

use crate::error::EngineError;

/// File under the layers directory that carries the build's BOM.
pub const BUILD_TOML: &str = "build.toml";

/// One component recorded in the build's bill of materials.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BomEntry {
    pub name: String,
    pub metadata: toml::Table,
    pub build: bool,
    pub launch: bool,
}

impl BomEntry {
    /// An entry for a dependency used only while building.
    pub fn build_only(dependency: &BuildpackDependency) -> Self {
        let mut metadata = toml::Table::new();
        let mut put = |key: &str, value: &str| {
            metadata.insert(key.to_owned(), toml::Value::String(value.to_owned()));
        };
        put("id", &dependency.id);
        if let Some(name) = &dependency.name {
            put("name", name);
        }
        put("version", &dependency.version);
        put("uri", &dependency.uri);
        put("sha256", &dependency.sha256);
        if let Some(purl) = &dependency.purl {
            put("purl", purl);
        }
        if !dependency.cpes.is_empty() {
            metadata.insert(
                "cpes".to_owned(),
                toml::Value::Array(
                    dependency
                        .cpes
                        .iter()
                        .map(|c| toml::Value::String(c.clone()))
                        .collect(),
                ),
            );
        }

        Self {
            name: dependency.id.clone(),
            metadata,
            build: true,
            launch: false,
        }
    }
}

#[derive(Serialize)]
struct BuildFile<'a> {
    bom: &'a [BomEntry],
}

/// Write `entries` as `[[bom]]` tables into `<layers>/build.toml`.
///
/// Nothing is written when there are no entries.
///
/// # Errors
/// Returns an error if the file cannot be serialized or written.
pub fn write_build_toml(layers_root: &Path, entries: &[BomEntry]) -> Result<(), EngineError> {
    if entries.is_empty() {
        return Ok(());
    }
    let path = layers_root.join(BUILD_TOML);
    let content = toml::to_string_pretty(&BuildFile { bom: entries }).map_err(|e| {
        EngineError::Metadata {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    })?;
    gradlepack_util::fs::ensure_dir(layers_root)?;
    gradlepack_util::fs::write_replacing(&path, content.as_bytes())?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gradle() -> BuildpackDependency {
        BuildpackDependency {
            id: "gradle".to_owned(),
            name: Some("Gradle".to_owned()),
            version: "8.5.0".to_owned(),
            uri: "https://example.com/gradle.tgz".to_owned(),
            sha256: "abc".to_owned(),
            stacks: Vec::new(),
            cpes: vec!["cpe:2.3:a:gradle:gradle:8.5:*:*:*:*:*:*:*".to_owned()],
            purl: Some("pkg:generic/gradle@8.5.0".to_owned()),
            licenses: Vec::new(),
        }
    }

    #[test]
    fn build_toml_lists_bom_entries() {
        let tmp = tempfile::tempdir().unwrap();

        write_build_toml(tmp.path(), &[BomEntry::build_only(&gradle())]).unwrap();

        let content = std::fs::read_to_string(tmp.path().join(BUILD_TOML)).unwrap();
        let parsed: toml::Table = toml::from_str(&content).unwrap();
        let bom = parsed.get("bom").and_then(toml::Value::as_array).unwrap();
        assert_eq!(bom.len(), 1);
        let entry = bom.first().and_then(toml::Value::as_table).unwrap();
        assert_eq!(entry.get("name").and_then(toml::Value::as_str), Some("gradle"));
        assert_eq!(entry.get("build").and_then(toml::Value::as_bool), Some(true));
        assert_eq!(
            entry
                .get("metadata")
                .and_then(|m| m.get("sha256"))
                .and_then(toml::Value::as_str),
            Some("abc")
        );
    }

    #[test]
    fn empty_bom_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        write_build_toml(tmp.path(), &[]).unwrap();
        assert!(!tmp.path().join(BUILD_TOML).exists());
    }

    #[test]
    fn build_only_entry_carries_dependency_identity() {
        let entry = BomEntry::build_only(&gradle());

        assert_eq!(entry.name, "gradle");
        assert!(entry.build);
        assert!(!entry.launch);
        assert_eq!(
            entry.metadata.get("version").and_then(toml::Value::as_str),
            Some("8.5.0")
        );
        assert_eq!(
            entry.metadata.get("purl").and_then(toml::Value::as_str),
            Some("pkg:generic/gradle@8.5.0")
        );
        assert_eq!(
            entry
                .metadata
                .get("cpes")
                .and_then(toml::Value::as_array)
                .map(Vec::len),
            Some(1)
        );
    }
}
