//! Build plan: what a detected project provides and requires.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const GRADLE: &str = "gradle";
pub const JVM_APPLICATION_PACKAGE: &str = "jvm-application-package";
pub const JDK: &str = "jdk";
pub const SYFT: &str = "syft";
pub const YARN: &str = "yarn";
pub const NODE: &str = "node";

/// A capability this buildpack contributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provide {
    pub name: String,
}

/// A capability this buildpack needs from another buildpack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Require {
    pub name: String,
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub metadata: toml::Table,
}

impl Require {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            metadata: toml::Table::new(),
        }
    }

    /// A requirement needed only while building, not at launch.
    pub fn build_only(name: &str) -> Self {
        let mut metadata = toml::Table::new();
        metadata.insert("build".to_owned(), toml::Value::Boolean(true));
        Self {
            name: name.to_owned(),
            metadata,
        }
    }
}

/// One alternative set of provides/requires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildPlan {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<Provide>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<Require>,
}

impl BuildPlan {
    /// Append a requirement unless one with the same name is already present.
    pub fn require(&mut self, require: Require) {
        if !self.requires.iter().any(|r| r.name == require.name) {
            self.requires.push(require);
        }
    }

    pub fn requires_names(&self) -> Vec<&str> {
        self.requires.iter().map(|r| r.name.as_str()).collect()
    }
}

/// The verdict of detection plus its plans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
    pub pass: bool,
    pub plans: Vec<BuildPlan>,
}

#[derive(Serialize)]
struct PlanFile<'a> {
    #[serde(flatten)]
    primary: &'a BuildPlan,
    #[serde(skip_serializing_if = "no_alternatives")]
    or: &'a [BuildPlan],
}

fn no_alternatives(plans: &&[BuildPlan]) -> bool {
    plans.is_empty()
}

impl DetectResult {
    /// A failed detection with no plans.
    pub fn fail() -> Self {
        Self::default()
    }

    /// Render the plans as a `plan.toml`: the first plan at top level,
    /// alternatives under `[[or]]`.
    ///
    /// # Errors
    /// Returns an error if the plan cannot be serialized.
    pub fn plan_toml(&self) -> Result<String, EngineError> {
        let Some((primary, rest)) = self.plans.split_first() else {
            return Ok(String::new());
        };
        toml::to_string_pretty(&PlanFile { primary, or: rest }).map_err(|e| EngineError::Metadata {
            path: "plan.toml".to_owned(),
            message: e.to_string(),
        })
    }
}
