//! Build orchestration: choose the Gradle command, assemble arguments,
//! reconcile bound properties, and lay out the ordered layer list.
//!
//! Layer order is fixed: distribution (only without a wrapper), bound
//! properties layers, the `~/.gradle` cache, then the application.

use std::path::{Path, PathBuf};

use gradlepack_config::bindings::resolve_one;
use gradlepack_config::resolver::{ADDITIONAL_BUILD_ARGUMENTS, BUILD_ARGUMENTS, INIT_SCRIPT_PATH};
use gradlepack_config::{Binding, ConfigurationResolver};
use gradlepack_util::error::UtilError;
use tracing::{debug, info, warn};

use crate::application::{self, Application};
use crate::bom::BomEntry;
use crate::dependency::{DependencyCache, DependencyResolver};
use crate::distribution::{self, Distribution};
use crate::error::EngineError;
use crate::home_cache::{self, HomeCache};
use crate::layer::{Layer, LayerTypes};
use crate::plan::GRADLE;
use crate::properties_file::{PropertiesFile, PropertiesKind};

/// Everything the host hands to one build pass.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub application_path: PathBuf,
    pub layers_path: PathBuf,
    /// Home directory of the build user; `.gradle` lives beneath it.
    pub home_dir: PathBuf,
    pub bindings: Vec<Binding>,
}

/// One layer decided by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildLayer {
    Distribution(Distribution),
    /// A reconciled bound properties file, keyed by its fingerprint.
    Properties {
        kind: PropertiesKind,
        fingerprint: String,
    },
    Cache(HomeCache),
    Application(Application),
}

impl BuildLayer {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Distribution(_) => distribution::LAYER_NAME,
            Self::Properties { kind, .. } => kind.layer_name(),
            Self::Cache(_) => home_cache::LAYER_NAME,
            Self::Application(_) => application::LAYER_NAME,
        }
    }

    pub fn types(&self) -> LayerTypes {
        match self {
            Self::Properties { .. } => LayerTypes::default(),
            Self::Distribution(_) | Self::Cache(_) | Self::Application(_) => LayerTypes {
                build: false,
                cache: true,
                launch: false,
            },
        }
    }

    /// Metadata the layer must carry; a stored layer with different
    /// metadata is contributed again.
    ///
    /// # Errors
    /// Returns an error if the metadata cannot be represented as TOML.
    pub fn metadata(&self) -> Result<toml::Table, EngineError> {
        Ok(match self {
            Self::Distribution(d) => d.metadata()?,
            Self::Properties { kind, fingerprint } => {
                let mut table = toml::Table::new();
                table.insert(
                    kind.metadata_key().to_owned(),
                    toml::Value::String(fingerprint.clone()),
                );
                table
            }
            Self::Cache(_) => toml::Table::new(),
            Self::Application(a) => a.metadata(),
        })
    }

    /// Populate a freshly reset layer directory.
    ///
    /// # Errors
    /// Returns an error if the layer content cannot be installed.
    pub fn install(&self, layer_path: &Path, cache: &dyn DependencyCache) -> Result<(), EngineError> {
        match self {
            Self::Distribution(d) => d.install(layer_path, cache),
            Self::Properties { .. } | Self::Cache(_) | Self::Application(_) => Ok(()),
        }
    }

    /// Wire a contributed layer into place outside the layers directory.
    ///
    /// # Errors
    /// Returns an error if the link cannot be created.
    pub fn link(&self, layer: &Layer) -> Result<(), EngineError> {
        match self {
            Self::Cache(home) => home.link(layer),
            Self::Distribution(_) | Self::Properties { .. } | Self::Application(_) => Ok(()),
        }
    }
}

/// Outcome of a build pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildResult {
    pub layers: Vec<BuildLayer>,
    pub bom: Vec<BomEntry>,
    pub command: PathBuf,
    pub arguments: Vec<String>,
}

impl BuildResult {
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(BuildLayer::name).collect()
    }
}

/// Plan the build for `ctx.application_path`.
///
/// Bound properties files are reconciled before this returns; layer
/// directories are populated later by [`crate::layer::contribute_all`].
///
/// # Errors
/// Returns an error if configuration is malformed, no Gradle distribution
/// can be resolved, more than one binding of a kind exists, or a bound file
/// cannot be reconciled.
pub fn build(
    ctx: &BuildContext,
    config: &ConfigurationResolver,
    resolver: &dyn DependencyResolver,
) -> Result<BuildResult, EngineError> {
    config.log_configuration();
    let mut result = BuildResult::default();

    let wrapper = ctx.application_path.join("gradlew");
    let command = if gradlepack_util::fs::exists(&wrapper)? {
        wrapper_command(wrapper, gradlepack_util::fs::make_executable)
    } else {
        let dependency = resolver.resolve(GRADLE, None)?;
        info!(version = %dependency.version, "no gradle wrapper, installing gradle distribution");
        result.bom.push(BomEntry::build_only(&dependency));
        result
            .layers
            .push(BuildLayer::Distribution(Distribution::new(dependency)));
        Distribution::executable(&ctx.layers_path.join(distribution::LAYER_NAME))
    };

    let home = HomeCache::for_home(&ctx.home_dir);

    let mut fingerprints = toml::Table::new();
    for kind in PropertiesKind::ALL {
        let Some(binding) = resolve_one(&ctx.bindings, kind.binding_type())? else {
            continue;
        };
        let file = PropertiesFile::new(kind, &kind.target_home(&home.path, &ctx.application_path));
        let Some(fingerprint) = file.reconcile(binding)? else {
            continue;
        };
        info!(binding = %binding.name, file = kind.file_name(), "applied bound properties");
        fingerprints.insert(
            kind.metadata_key().to_owned(),
            toml::Value::String(fingerprint.clone()),
        );
        result
            .layers
            .push(BuildLayer::Properties { kind, fingerprint });
    }

    result.layers.push(BuildLayer::Cache(home));

    let mut arguments = config.resolve_arguments(BUILD_ARGUMENTS)?;
    arguments.extend(config.resolve_arguments(ADDITIONAL_BUILD_ARGUMENTS)?);
    if let Some(init_script) = config.resolve(INIT_SCRIPT_PATH) {
        arguments.splice(0..0, ["--init-script".to_owned(), init_script.to_owned()]);
    }

    result.layers.push(BuildLayer::Application(Application {
        command: command.clone(),
        arguments: arguments.clone(),
        fingerprints,
        artifact_pattern: application::artifact_pattern(config),
    }));
    result.command = command;
    result.arguments = arguments;

    Ok(result)
}

/// Use the project's wrapper; failing to mark it executable is only a warning.
fn wrapper_command(wrapper: PathBuf, make_executable: impl FnOnce(&Path) -> Result<(), UtilError>) -> PathBuf {
    if let Err(e) = make_executable(&wrapper) {
        warn!(path = %wrapper.display(), error = %e, "unable to make gradle wrapper executable");
    }
    debug!(command = %wrapper.display(), "using gradle wrapper");
    wrapper
}
