//! Package versions.
//!
//! A version is either a dotted numeric tuple (`1.2.3`, with unset trailing
//! components) or an opaque branch name (`master`). `"*"` denotes "any
//! version" and renders without a qualifier. Branch versions are never
//! compared numerically.

use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, Result};

/// Marker for an unset numeric component.
pub const UNSET: i32 = -1;

/// A package version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    /// A dotted numeric tuple; `-1` marks an unset component.
    Number { major: i32, minor: i32, patch: i32 },
    /// An opaque branch name.
    Branch(String),
}

impl Default for Version {
    fn default() -> Self {
        Version::any()
    }
}

impl Version {
    /// The "any version" value (`*`).
    pub fn any() -> Self {
        Version::Number {
            major: UNSET,
            minor: UNSET,
            patch: UNSET,
        }
    }

    /// Parse a version string: `*`, a numeric tuple, or a branch name.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() || s == "*" {
            return Ok(Version::any());
        }
        if s.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            let mut parts = [UNSET; 3];
            let split: Vec<&str> = s.split('.').collect();
            if split.len() > 3 {
                return Err(ModelError::InvalidVersion {
                    version: s.to_string(),
                    detail: "more than three components".to_string(),
                });
            }
            for (i, part) in split.iter().enumerate() {
                parts[i] = part.parse().map_err(|_| ModelError::InvalidVersion {
                    version: s.to_string(),
                    detail: format!("non-numeric component '{part}'"),
                })?;
            }
            return Ok(Version::Number {
                major: parts[0],
                minor: parts[1],
                patch: parts[2],
            });
        }
        if !is_valid_branch(s) {
            return Err(ModelError::InvalidVersion {
                version: s.to_string(),
                detail: "invalid branch name".to_string(),
            });
        }
        Ok(Version::Branch(s.to_string()))
    }

    /// Whether this version is a branch name.
    pub fn is_branch(&self) -> bool {
        matches!(self, Version::Branch(_))
    }

    /// Whether this version matches anything (all components unset).
    pub fn is_any(&self) -> bool {
        matches!(
            self,
            Version::Number {
                major: UNSET,
                minor: UNSET,
                patch: UNSET,
            }
        )
    }

    /// Copy with the patch component dropped (used for alias derivation).
    pub fn without_patch(&self) -> Version {
        match *self {
            Version::Number { major, minor, .. } => Version::Number {
                major,
                minor,
                patch: UNSET,
            },
            ref b => b.clone(),
        }
    }

    /// Copy with the minor and patch components dropped.
    pub fn without_minor(&self) -> Version {
        match *self {
            Version::Number { major, .. } => Version::Number {
                major,
                minor: UNSET,
                patch: UNSET,
            },
            ref b => b.clone(),
        }
    }

    /// Render, dropping trailing unset components; all-unset renders as `*`.
    pub fn to_any_string(&self) -> String {
        match self {
            Version::Branch(b) => b.clone(),
            Version::Number {
                major,
                minor,
                patch,
            } => {
                let mut parts = vec![*major, *minor, *patch];
                while parts.last() == Some(&UNSET) {
                    parts.pop();
                }
                if parts.is_empty() {
                    return "*".to_string();
                }
                parts
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(".")
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_any_string())
    }
}

impl FromStr for Version {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

fn is_valid_branch(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
