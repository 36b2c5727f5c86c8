//! Model error types.

/// Errors that can occur while constructing model values.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A package path contained an invalid segment.
    #[error("invalid package path '{path}': {detail}")]
    InvalidPath { path: String, detail: String },

    /// A version string was neither a numeric tuple nor a branch name.
    #[error("invalid version '{version}': {detail}")]
    InvalidVersion { version: String, detail: String },

    /// Unknown storage scope name.
    #[error("unknown packages_dir '{value}' (expected one of: local, user, system)")]
    UnknownStorageScope { value: String },

    /// Unknown option level tag.
    #[error("unknown option level '{value}' (expected one of: any, static, shared)")]
    UnknownOptionLevel { value: String },

    /// Two distinct (package, version) pairs collided after name derivation.
    #[error("derived target name '{target_name}' collides between two packages")]
    NameCollision { target_name: String },
}

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
