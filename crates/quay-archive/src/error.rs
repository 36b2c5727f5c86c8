//! Archive error types.

use std::path::PathBuf;

/// Errors raised during source discovery, validation, and archiving.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The project declares no sources and resolves to no files.
    #[error("no source files: {detail}")]
    NoSources { detail: String },

    /// One or more files failed validation; all violations are collected
    /// into a single report.
    #[error("project sources did not pass file checks:\n{report}")]
    FileChecks { report: String },

    /// A source pattern is not a valid regular expression.
    #[error("invalid source pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    /// The declared license file does not exist.
    #[error("license file does not exist: {path}")]
    MissingLicense { path: PathBuf },

    /// The declared license file is not acceptable.
    #[error("license is invalid (should be plain text and less than 512 KB): {path}")]
    InvalidLicense { path: PathBuf },

    /// An archive entry tried to escape the extraction directory.
    #[error("archive entry escapes destination: {entry}")]
    Traversal { entry: String },

    /// I/O failure naming the involved path.
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
