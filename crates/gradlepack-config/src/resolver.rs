//! Resolution of `BP_*` options: environment first, then declared defaults.

use std::collections::HashMap;

use tracing::info;

use crate::buildpack::{Buildpack, Configuration};
use crate::error::ConfigError;

/// Build-file override, relative to the application root.
pub const BUILD_FILE: &str = "BP_GRADLE_BUILD_FILE";
/// Primary Gradle arguments.
pub const BUILD_ARGUMENTS: &str = "BP_GRADLE_BUILD_ARGUMENTS";
/// Arguments appended after [`BUILD_ARGUMENTS`].
pub const ADDITIONAL_BUILD_ARGUMENTS: &str = "BP_GRADLE_ADDITIONAL_BUILD_ARGUMENTS";
/// Init script passed with `--init-script`.
pub const INIT_SCRIPT_PATH: &str = "BP_GRADLE_INIT_SCRIPT_PATH";
/// Enables the Node/Yarn toolchain probe during detection.
pub const INSTALL_NODE: &str = "BP_JAVA_INSTALL_NODE";
/// Sub-directory searched for `yarn.lock` / `package.json`.
pub const NODE_PROJECT_PATH: &str = "BP_NODE_PROJECT_PATH";
/// Module whose output is the built application.
pub const BUILT_MODULE: &str = "BP_GRADLE_BUILT_MODULE";
/// Glob of the built application artifact.
pub const BUILT_ARTIFACT: &str = "BP_GRADLE_BUILT_ARTIFACT";

/// The options this buildpack understands, with their defaults.
pub fn default_configurations() -> Vec<Configuration> {
    vec![
        Configuration::build(BUILD_FILE, None),
        Configuration::build(
            BUILD_ARGUMENTS,
            Some("--no-daemon -Dorg.gradle.welcome=never assemble"),
        ),
        Configuration::build(ADDITIONAL_BUILD_ARGUMENTS, None),
        Configuration::build(INIT_SCRIPT_PATH, None),
        Configuration::build(INSTALL_NODE, Some("false")),
        Configuration::build(NODE_PROJECT_PATH, None),
        Configuration::build(BUILT_MODULE, None),
        Configuration::build(BUILT_ARTIFACT, Some("build/libs/*.[jw]ar")),
    ]
}

/// An immutable view over configuration for one detect or build pass.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationResolver {
    configurations: Vec<Configuration>,
    environment: HashMap<String, String>,
}

impl ConfigurationResolver {
    pub fn new(configurations: Vec<Configuration>, environment: HashMap<String, String>) -> Self {
        Self {
            configurations,
            environment,
        }
    }

    /// Use the configurations declared in `buildpack`.
    pub fn from_buildpack(buildpack: &Buildpack, environment: HashMap<String, String>) -> Self {
        Self::new(buildpack.metadata.configurations.clone(), environment)
    }

    /// Resolve `name` to its effective value.
    ///
    /// A set environment variable wins over the declared default. An empty
    /// effective value counts as unset.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let value = match self.environment.get(name) {
            Some(v) => Some(v.as_str()),
            None => self
                .configurations
                .iter()
                .find(|c| c.name == name)
                .and_then(|c| c.default.as_deref()),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Resolve `name` as a boolean; unset is `false`.
    ///
    /// # Errors
    /// Returns an error if the value is not a recognised boolean spelling.
    pub fn resolve_bool(&self, name: &str) -> Result<bool, ConfigError> {
        let Some(value) = self.resolve(name) else {
            return Ok(false);
        };
        match value {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            other => Err(ConfigError::InvalidBool {
                name: name.to_owned(),
                value: other.to_owned(),
            }),
        }
    }

    /// Resolve `name` and split it into arguments with shell quoting rules.
    ///
    /// # Errors
    /// Returns an error if the value has unbalanced quotes.
    pub fn resolve_arguments(&self, name: &str) -> Result<Vec<String>, ConfigError> {
        let Some(value) = self.resolve(name) else {
            return Ok(Vec::new());
        };
        shlex::split(value).ok_or_else(|| ConfigError::InvalidArguments {
            name: name.to_owned(),
            value: value.to_owned(),
        })
    }

    /// Log every declared build-time option and its effective value.
    pub fn log_configuration(&self) {
        for config in self.configurations.iter().filter(|c| c.build) {
            let source = if self.environment.contains_key(&config.name) {
                "environment"
            } else {
                "default"
            };
            info!(
                name = %config.name,
                value = self.resolve(&config.name).unwrap_or(""),
                source,
                "configuration"
            );
        }
    }
}
