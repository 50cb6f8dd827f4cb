//! Reconciliation of bound `gradle.properties` and
//! `gradle-wrapper.properties` files into the locations Gradle reads.
//!
//! `gradle.properties` is linked into the Gradle user home so the binding
//! stays authoritative. `gradle-wrapper.properties` is merged key by key over
//! the project's own file, which keeps version pinning the binding does not
//! mention.

use std::path::{Path, PathBuf};

use gradlepack_config::SecretSource;
use gradlepack_util::error::UtilError;
use gradlepack_util::properties::Properties;
use tracing::debug;

use crate::error::EngineError;

/// How a bound file becomes the effective file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// The effective file is a symlink to the bound file.
    Replace,
    /// Bound keys override the existing file; all other keys survive.
    Merge,
}

/// The two kinds of bound properties file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertiesKind {
    GradleProperties,
    GradleWrapperProperties,
}

impl PropertiesKind {
    /// Every kind, in contribution order.
    pub const ALL: [Self; 2] = [Self::GradleProperties, Self::GradleWrapperProperties];

    /// Binding type that carries this file.
    pub fn binding_type(self) -> &'static str {
        match self {
            Self::GradleProperties => "gradle",
            Self::GradleWrapperProperties => "gradle-wrapper",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::GradleProperties => "gradle.properties",
            Self::GradleWrapperProperties => "gradle-wrapper.properties",
        }
    }

    pub fn layer_name(self) -> &'static str {
        match self {
            Self::GradleProperties => "gradle-properties",
            Self::GradleWrapperProperties => "gradle-wrapper-properties",
        }
    }

    /// Metadata key under which the bound file's SHA-256 is recorded.
    pub fn metadata_key(self) -> &'static str {
        match self {
            Self::GradleProperties => "gradle-properties-sha256",
            Self::GradleWrapperProperties => "gradle-wrapper-properties-sha256",
        }
    }

    pub fn policy(self) -> ReconcilePolicy {
        match self {
            Self::GradleProperties => ReconcilePolicy::Replace,
            Self::GradleWrapperProperties => ReconcilePolicy::Merge,
        }
    }

    /// Directory holding the effective file.
    pub fn target_home(self, gradle_home: &Path, application: &Path) -> PathBuf {
        match self {
            Self::GradleProperties => gradle_home.to_path_buf(),
            Self::GradleWrapperProperties => application.join("gradle").join("wrapper"),
        }
    }
}

/// Make `target` reflect `bound_file` under `policy`.
///
/// A missing `target` is treated as empty when merging.
///
/// # Errors
/// Returns an error if either file cannot be read, or the target cannot be
/// linked or written.
pub fn reconcile(policy: ReconcilePolicy, bound_file: &Path, target: &Path) -> Result<(), UtilError> {
    if let Some(parent) = target.parent() {
        gradlepack_util::fs::ensure_dir(parent)?;
    }

    match policy {
        ReconcilePolicy::Replace => {
            // A relative link target would resolve against the link's directory.
            let bound_file = std::path::absolute(bound_file)
                .map_err(|source| UtilError::io("resolve", bound_file, source))?;
            debug!(link = %target.display(), bound = %bound_file.display(), "linking bound properties");
            gradlepack_util::fs::replace_symlink(&bound_file, target)
        }
        ReconcilePolicy::Merge => {
            let bound = Properties::from_path(bound_file)?;
            let mut merged = Properties::from_path_or_default(target)?;
            debug!(
                target = %target.display(),
                keys = ?bound.keys().collect::<Vec<_>>(),
                "merging bound properties"
            );
            merged.merge(&bound);
            merged.write_to(target)
        }
    }
}

/// One bound properties file and where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertiesFile {
    pub kind: PropertiesKind,
    pub target_home: PathBuf,
}

impl PropertiesFile {
    pub fn new(kind: PropertiesKind, target_home: &Path) -> Self {
        Self {
            kind,
            target_home: target_home.to_path_buf(),
        }
    }

    pub fn target(&self) -> PathBuf {
        self.target_home.join(self.kind.file_name())
    }

    /// Reconcile the file carried by `source`, returning its SHA-256.
    ///
    /// Returns `Ok(None)` when `source` does not carry the file.
    ///
    /// # Errors
    /// Returns an error if reconciliation or hashing fails.
    pub fn reconcile(&self, source: &dyn SecretSource) -> Result<Option<String>, EngineError> {
        let file_name = self.kind.file_name();
        let Some(bound) = source.secret_file_path(file_name) else {
            debug!(file = file_name, "binding does not carry file, skipping");
            return Ok(None);
        };

        reconcile(self.kind.policy(), &bound, &self.target()).map_err(|source| {
            EngineError::Reconcile {
                file: file_name.to_owned(),
                source,
            }
        })?;

        let fingerprint = gradlepack_util::hash::sha256_file(&bound)?;
        Ok(Some(fingerprint))
    }
}
