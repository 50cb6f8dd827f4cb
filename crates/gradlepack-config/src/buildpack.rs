use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// The `buildpack.toml` descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Buildpack {
    #[serde(default)]
    pub api: String,
    #[serde(rename = "buildpack", default)]
    pub info: BuildpackInfo,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stacks: Vec<Stack>,
    #[serde(default)]
    pub metadata: BuildpackMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildpackInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stack {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildpackMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configurations: Vec<Configuration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<BuildpackDependency>,
}

/// A `BP_*` option with its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the option is honored at build time.
    #[serde(default)]
    pub build: bool,
    /// Whether the option is honored at launch time.
    #[serde(default)]
    pub launch: bool,
}

impl Configuration {
    /// A build-time option with an optional default.
    pub fn build(name: &str, default: Option<&str>) -> Self {
        Self {
            name: name.to_owned(),
            default: default.map(str::to_owned),
            description: None,
            build: true,
            launch: false,
        }
    }
}

/// A downloadable artifact the buildpack may install, e.g. a Gradle distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildpackDependency {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub version: String,
    pub uri: String,
    pub sha256: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stacks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cpes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<License>,
}

impl BuildpackDependency {
    /// Whether this dependency may be installed on `stack_id`.
    ///
    /// An empty stack list or a `*` entry matches every stack.
    pub fn supports_stack(&self, stack_id: &str) -> bool {
        self.stacks.is_empty() || self.stacks.iter().any(|s| s == "*" || s == stack_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Buildpack {
    /// Read and parse a `buildpack.toml` from the given path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Look up a configuration declaration by name.
    pub fn configuration(&self, name: &str) -> Option<&Configuration> {
        self.metadata.configurations.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"
api = "0.7"

[buildpack]
id = "gradlepack/gradle"
name = "Gradle Buildpack"
version = "1.0.0"

[[stacks]]
id = "*"

[[metadata.configurations]]
name = "BP_GRADLE_BUILD_ARGUMENTS"
default = "--no-daemon -Dorg.gradle.welcome=never assemble"
description = "the arguments to pass to Gradle"
build = true

[[metadata.configurations]]
name = "BP_GRADLE_INIT_SCRIPT_PATH"
build = true

[[metadata.dependencies]]
id = "gradle"
name = "Gradle"
version = "8.5.0"
uri = "https://example.com/gradle-8.5-bin.tgz"
sha256 = "abc123"
stacks = ["io.buildpacks.stacks.jammy", "*"]
cpes = ["cpe:2.3:a:gradle:gradle:8.5:*:*:*:*:*:*:*"]
purl = "pkg:generic/gradle@8.5.0"

  [[metadata.dependencies.licenses]]
  type = "Apache-2.0"
  uri = "https://docs.gradle.org/current/userguide/licenses.html"
"#;

    #[test]
    fn parses_full_descriptor() {
        let bp: Buildpack = toml::from_str(DESCRIPTOR).unwrap();
        assert_eq!(bp.api, "0.7");
        assert_eq!(bp.info.id, "gradlepack/gradle");
        assert_eq!(bp.metadata.configurations.len(), 2);
        assert_eq!(
            bp.configuration("BP_GRADLE_BUILD_ARGUMENTS")
                .and_then(|c| c.default.as_deref()),
            Some("--no-daemon -Dorg.gradle.welcome=never assemble")
        );
        assert_eq!(
            bp.configuration("BP_GRADLE_INIT_SCRIPT_PATH")
                .map(|c| c.default.is_none()),
            Some(true)
        );

        let dep = bp.metadata.dependencies.first().unwrap();
        assert_eq!(dep.id, "gradle");
        assert_eq!(dep.purl.as_deref(), Some("pkg:generic/gradle@8.5.0"));
        assert_eq!(
            dep.licenses.first().and_then(|l| l.kind.as_deref()),
            Some("Apache-2.0")
        );
    }

    #[test]
    fn empty_descriptor_is_valid() {
        let bp: Buildpack = toml::from_str("").unwrap();
        assert!(bp.metadata.configurations.is_empty());
        assert!(bp.metadata.dependencies.is_empty());
    }

    #[test]
    fn supports_stack_rules() {
        let bp: Buildpack = toml::from_str(DESCRIPTOR).unwrap();
        let mut dep = bp.metadata.dependencies.first().unwrap().clone();
        assert!(dep.supports_stack("anything"));

        dep.stacks = vec!["test-stack-id".to_owned()];
        assert!(dep.supports_stack("test-stack-id"));
        assert!(!dep.supports_stack("other"));

        dep.stacks.clear();
        assert!(dep.supports_stack("other"));
    }

    #[test]
    fn from_path_reports_parse_errors_with_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("buildpack.toml");
        std::fs::write(&path, "[buildpack\n").unwrap();

        let err = Buildpack::from_path(&path).unwrap_err();
        assert!(err.to_string().contains("buildpack.toml"));
    }
}
