//! Detection, build-plan composition, layer assembly, and bound-properties
//! reconciliation for the Gradle buildpack.

pub mod application;
pub mod bom;
pub mod build;
pub mod cache;
pub mod dependency;
pub mod detect;
pub mod distribution;
pub mod error;
pub mod home_cache;
pub mod layer;
pub mod plan;
pub mod properties_file;

pub use build::{build, BuildContext, BuildLayer, BuildResult};
pub use cache::CacheKey;
pub use dependency::{BuildpackDependencyResolver, DependencyCache, DependencyResolver, DownloadCache};
pub use detect::detect;
pub use error::EngineError;
pub use layer::{contribute_all, Layer, LayerTypes, Layers};
pub use plan::{BuildPlan, DetectResult};
pub use properties_file::{PropertiesFile, PropertiesKind, ReconcilePolicy};
