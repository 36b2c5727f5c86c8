//! Hierarchical package paths.
//!
//! A package path is a dot- or slash-delimited identifier such as
//! `org.sqlite.sqlite3`. The first segment decides whether the path is
//! absolute (one of the reserved namespace roots) or relative, in which
//! case it must be resolved against a configured root project before use.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ModelError, Result};

/// Namespace roots that make a path absolute.
const NAMESPACE_ROOTS: [&str; 3] = ["org", "com", "pvt"];

/// A hierarchical, globally unique package identifier.
///
/// Ordering and equality are segment-lexicographic, so paths can serve as
/// map keys throughout the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectPath {
    segments: Vec<String>,
}

impl ProjectPath {
    /// Parse a path from a dot- or slash-delimited string.
    ///
    /// An empty string yields the empty path (used for anonymous root
    /// projects before resolution).
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(ProjectPath::default());
        }
        let mut segments = Vec::new();
        for seg in s.split(['.', '/']) {
            if !is_valid_segment(seg) {
                return Err(ModelError::InvalidPath {
                    path: s.to_string(),
                    detail: format!("bad segment '{seg}'"),
                });
            }
            segments.push(seg.to_string());
        }
        Ok(ProjectPath { segments })
    }

    /// Whether this path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether this path must be resolved against a root project.
    pub fn is_relative(&self) -> bool {
        !self.is_empty() && !self.is_absolute()
    }

    /// Whether this path starts with a reserved namespace root.
    pub fn is_absolute(&self) -> bool {
        self.segments
            .first()
            .is_some_and(|s| NAMESPACE_ROOTS.contains(&s.as_str()))
    }

    /// Append another path, producing `self/other`.
    pub fn join(&self, other: &ProjectPath) -> ProjectPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        ProjectPath { segments }
    }

    /// The path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Render as a filesystem path, one directory per segment.
    pub fn to_fs_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl FromStr for ProjectPath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        ProjectPath::parse(s)
    }
}

fn is_valid_segment(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
