//! Error types for gradlepack-engine.

/// Errors produced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A filesystem operation failed.
    #[error("cannot {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        source: std::io::Error,
    },

    /// A utility operation failed.
    #[error("{0}")]
    Util(#[from] gradlepack_util::error::UtilError),

    /// Configuration or binding resolution failed.
    #[error("{0}")]
    Config(#[from] gradlepack_config::ConfigError),

    /// No buildpack dependency matches the request.
    #[error("no valid dependencies for {id}, {version}, and {stack} in [{candidates}]")]
    DependencyNotFound {
        id: String,
        version: String,
        stack: String,
        candidates: String,
    },

    /// A version constraint could not be parsed.
    #[error("invalid version constraint \"{constraint}\" for {id}: {message}")]
    InvalidConstraint {
        id: String,
        constraint: String,
        message: String,
    },

    /// A bound properties file could not be reconciled.
    #[error("cannot reconcile bound {file}: {source}")]
    Reconcile {
        file: String,
        source: gradlepack_util::error::UtilError,
    },

    /// Layer or plan metadata serialization/deserialization failed.
    #[error("cannot process metadata {path}: {message}")]
    Metadata { path: String, message: String },
}
