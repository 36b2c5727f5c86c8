//! Schema error types.
//!
//! Every malformed project description is fatal and reported with the
//! offending key; nothing in this taxonomy is recoverable.

use std::path::PathBuf;

/// Errors raised while mapping a structured description into the model.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A key held the wrong kind of node.
    #[error("'{key}' should be a {expected}")]
    WrongKind {
        key: String,
        expected: &'static str,
    },

    /// An unknown key inside a dependency detail map.
    #[error("unknown key '{key}' in dependency '{dependency}'")]
    UnknownKey { key: String, dependency: String },

    /// Mutually exclusive project flags both set.
    #[error("project cannot be static_only and shared_only simultaneously")]
    ExclusiveLinkage,

    /// A root_directory that points above the workspace.
    #[error("'root_directory' cannot escape the workspace: {dir}")]
    RootEscape { dir: String },

    /// A scalar failed model-level validation (bad path, version, scope).
    #[error(transparent)]
    Model(#[from] quay_model::ModelError),

    /// The document itself failed to parse.
    #[error("invalid document: {0}")]
    Document(#[from] toml::de::Error),

    /// A required file could not be read or written.
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
