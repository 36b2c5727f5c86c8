//! Registry error types.

use std::path::PathBuf;

/// Errors that can occur during resolution and materialization.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The registry reported a failure for the whole request.
    #[error("registry error: {message}")]
    RegistryFailure { message: String },

    /// The registry answered with an unsupported protocol revision.
    #[error("unsupported registry api version: {api}")]
    UnsupportedApi { api: i64 },

    /// A returned direct package matches no declared constraint.
    #[error("registry returned unrequested package '{package}'")]
    UnmatchedPackage { package: String },

    /// A package references a peer id absent from the response table.
    #[error("package '{package}' references unknown peer id {id}")]
    UnknownPeer { package: String, id: u64 },

    /// The response itself is malformed.
    #[error("malformed registry response: {detail}")]
    Protocol { detail: String },

    /// Downloaded archive does not match the resolver-declared hash.
    #[error("integrity check failed for '{package}': expected {expected}, got {actual}")]
    IntegrityFailure {
        package: String,
        expected: String,
        actual: String,
    },

    /// Archive download failure.
    #[error("download failed for {url}: {detail}")]
    Download { url: String, detail: String },

    /// Cache I/O error.
    #[error("cache error at {path}: {detail}")]
    Cache { path: PathBuf, detail: String },

    /// Archive extraction error.
    #[error(transparent)]
    Archive(#[from] quay_archive::ArchiveError),

    /// Model-level validation error (bad path or version in a response).
    #[error(transparent)]
    Model(#[from] quay_model::ModelError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
