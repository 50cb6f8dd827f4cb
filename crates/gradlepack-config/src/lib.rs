//! Parse `buildpack.toml`, resolve `BP_*` configuration, and discover service bindings.

pub mod bindings;
pub mod buildpack;
pub mod error;
pub mod resolver;

pub use bindings::{resolve_one, Binding, SecretSource};
pub use buildpack::{Buildpack, BuildpackDependency, Configuration};
pub use error::ConfigError;
pub use resolver::ConfigurationResolver;
