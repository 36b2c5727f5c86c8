//! Generation error types.

use std::path::PathBuf;

/// Errors raised while generating build descriptors.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// A package config declares several projects but none matches the
    /// requested package path.
    #[error("no such project '{package}' in dependencies list")]
    MissingProject { package: String },

    /// A package config declares no projects at all.
    #[error("package '{package}' has no projects")]
    NoProjects { package: String },

    /// Descriptor output failure.
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for generation.
pub type Result<T> = std::result::Result<T, EmitError>;
