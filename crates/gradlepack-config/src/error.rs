//! Error types for gradlepack-config.

/// Errors produced while reading buildpack configuration and bindings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid buildpack.toml at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    /// A boolean option holds something other than a recognised boolean.
    #[error("invalid value \"{value}\" for {name} — expected true or false")]
    InvalidBool { name: String, value: String },

    /// An argument option cannot be split into shell words.
    #[error("invalid value \"{value}\" for {name} — unbalanced quotes or trailing escape")]
    InvalidArguments { name: String, value: String },

    /// A binding directory has no `type` file.
    #[error("binding at {path} has no type — add a `type` file")]
    MissingBindingType { path: String },

    /// More than one binding matched where at most one is honored.
    #[error("found {count} bindings of type {binding_type} — expected at most one")]
    MultipleBindings { binding_type: String, count: usize },
}
