//! Buildpack dependency resolution and the local artifact cache.

use std::path::{Path, PathBuf};

use gradlepack_config::{Buildpack, BuildpackDependency};
use gradlepack_util::error::UtilError;
use semver::{Version, VersionReq};
use tracing::{debug, info, warn};

use crate::error::EngineError;

/// Maps a logical dependency id and optional version constraint to a
/// concrete artifact.
pub trait DependencyResolver {
    /// # Errors
    /// Returns an error if no dependency matches `id`, `version`, and the
    /// current stack.
    fn resolve(&self, id: &str, version: Option<&str>) -> Result<BuildpackDependency, EngineError>;
}

/// Materializes a dependency's artifact on local disk.
pub trait DependencyCache {
    /// Return the local path of the artifact, fetching it if needed.
    ///
    /// # Errors
    /// Returns an error if the artifact cannot be fetched or fails verification.
    fn artifact(&self, dependency: &BuildpackDependency) -> Result<PathBuf, EngineError>;
}

/// Resolves against the `[[metadata.dependencies]]` of a `buildpack.toml`.
#[derive(Debug, Clone)]
pub struct BuildpackDependencyResolver {
    dependencies: Vec<BuildpackDependency>,
    stack_id: String,
}

impl BuildpackDependencyResolver {
    pub fn new(dependencies: Vec<BuildpackDependency>, stack_id: &str) -> Self {
        Self {
            dependencies,
            stack_id: stack_id.to_owned(),
        }
    }

    pub fn from_buildpack(buildpack: &Buildpack, stack_id: &str) -> Self {
        Self::new(buildpack.metadata.dependencies.clone(), stack_id)
    }
}

impl DependencyResolver for BuildpackDependencyResolver {
    fn resolve(&self, id: &str, version: Option<&str>) -> Result<BuildpackDependency, EngineError> {
        let constraint = version.map(str::trim).filter(|v| !v.is_empty() && *v != "*");
        let requirement = constraint
            .map(|c| {
                VersionReq::parse(c).map_err(|e| EngineError::InvalidConstraint {
                    id: id.to_owned(),
                    constraint: c.to_owned(),
                    message: e.to_string(),
                })
            })
            .transpose()?;

        let best = self
            .dependencies
            .iter()
            .filter(|d| d.id == id && d.supports_stack(&self.stack_id))
            .filter_map(|d| parse_version(&d.version).map(|v| (v, d)))
            .filter(|(v, _)| requirement.as_ref().map_or(true, |r| r.matches(v)))
            .max_by(|a, b| a.0.cmp(&b.0));

        match best {
            Some((version, dependency)) => {
                debug!(id, %version, stack = %self.stack_id, "resolved dependency");
                Ok(dependency.clone())
            }
            None => Err(EngineError::DependencyNotFound {
                id: id.to_owned(),
                version: constraint.unwrap_or("*").to_owned(),
                stack: self.stack_id.clone(),
                candidates: self
                    .dependencies
                    .iter()
                    .map(|d| format!("({}, {}, {})", d.id, d.version, d.stacks.join(" ")))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }
}

/// Parse a dependency version, padding short forms such as `8.5` to `8.5.0`.
fn parse_version(raw: &str) -> Option<Version> {
    let (core, suffix) = match raw.find(['-', '+']) {
        Some(i) => raw.split_at(i),
        None => (raw, ""),
    };
    let padded = match core.matches('.').count() {
        0 => format!("{core}.0.0{suffix}"),
        1 => format!("{core}.0{suffix}"),
        _ => raw.to_owned(),
    };
    Version::parse(&padded).ok()
}

/// Verified artifacts stored at `<root>/<sha256>/<file name>`.
#[derive(Debug, Clone)]
pub struct DownloadCache {
    root: PathBuf,
}

impl DownloadCache {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn entry_path(&self, dependency: &BuildpackDependency) -> PathBuf {
        let file_name = dependency
            .uri
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("artifact");
        self.root.join(&dependency.sha256).join(file_name)
    }
}

impl DependencyCache for DownloadCache {
    fn artifact(&self, dependency: &BuildpackDependency) -> Result<PathBuf, EngineError> {
        let path = self.entry_path(dependency);

        if gradlepack_util::fs::exists(&path)? {
            if gradlepack_util::hash::sha256_file(&path)? == dependency.sha256 {
                debug!(path = %path.display(), "reusing cached dependency");
                return Ok(path);
            }
            warn!(path = %path.display(), "cached dependency is corrupt, fetching again");
            gradlepack_util::fs::remove_file_if_exists(&path)?;
        }

        if let Some(parent) = path.parent() {
            gradlepack_util::fs::ensure_dir(parent)?;
        }

        let actual = match dependency.uri.strip_prefix("file://") {
            Some(local) => {
                info!(uri = %dependency.uri, "copying dependency");
                std::fs::copy(local, &path).map_err(|source| EngineError::Io {
                    action: "copy",
                    path: local.to_owned(),
                    source,
                })?;
                gradlepack_util::hash::sha256_file(&path)?
            }
            None => gradlepack_util::download::download(&dependency.uri, &path)?,
        };

        if actual != dependency.sha256 {
            gradlepack_util::fs::remove_file_if_exists(&path)?;
            return Err(UtilError::HashMismatch {
                path: dependency.uri.clone(),
                expected: dependency.sha256.clone(),
                actual,
            }
            .into());
        }

        Ok(path)
    }
}
