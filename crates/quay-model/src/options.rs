//! Option levels, option blocks, and raw build-system insertions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, Result};

/// Scope tag controlling whether a directive applies regardless of, or only
/// under, a particular link-kind choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionLevel {
    Any,
    Static,
    Shared,
}

impl OptionLevel {
    /// All levels in emission order.
    pub const ALL: [OptionLevel; 3] = [OptionLevel::Any, OptionLevel::Static, OptionLevel::Shared];
}

impl fmt::Display for OptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OptionLevel::Any => "any",
            OptionLevel::Static => "static",
            OptionLevel::Shared => "shared",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OptionLevel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "any" => Ok(OptionLevel::Any),
            "static" => Ok(OptionLevel::Static),
            "shared" => Ok(OptionLevel::Shared),
            _ => Err(ModelError::UnknownOptionLevel {
                value: s.to_string(),
            }),
        }
    }
}

/// Directive visibility within a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    Public,
    Private,
    Interface,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Interface => "interface",
        };
        write!(f, "{s}")
    }
}

/// Raw build-system text injected at four ordered hook points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Insertions {
    pub pre_sources: String,
    pub post_sources: String,
    pub post_target: String,
    pub post_alias: String,
}

impl Insertions {
    /// The insertion text for a given hook.
    pub fn hook(&self, hook: Hook) -> &str {
        match hook {
            Hook::PreSources => &self.pre_sources,
            Hook::PostSources => &self.post_sources,
            Hook::PostTarget => &self.post_target,
            Hook::PostAlias => &self.post_alias,
        }
    }
}

/// The four injection points of a package descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    PreSources,
    PostSources,
    PostTarget,
    PostAlias,
}

impl Hook {
    /// All hooks in descriptor order.
    pub const ALL: [Hook; 4] = [
        Hook::PreSources,
        Hook::PostSources,
        Hook::PostTarget,
        Hook::PostAlias,
    ];

    /// Human-readable section name.
    pub fn title(&self) -> &'static str {
        match self {
            Hook::PreSources => "pre sources",
            Hook::PostSources => "post sources",
            Hook::PostTarget => "post target",
            Hook::PostAlias => "post alias",
        }
    }
}

/// Directives attached to one option level.
#[derive(Debug, Clone, Default)]
pub struct OptionBlock {
    /// Preprocessor definitions, flattened to (visibility, definition).
    pub definitions: BTreeSet<(Visibility, String)>,
    pub include_directories: BTreeSet<String>,
    pub link_directories: BTreeSet<String>,
    pub link_libraries: BTreeSet<String>,
    /// Hoisted to workspace scope during generation.
    pub global_definitions: BTreeSet<String>,
    pub insertions: Insertions,
}

impl OptionBlock {
    /// Merge another block's global definitions into this one.
    pub fn absorb_globals(&mut self, other: &OptionBlock) {
        self.global_definitions
            .extend(other.global_definitions.iter().cloned());
    }
}

/// Option blocks keyed by level.
pub type Options = BTreeMap<OptionLevel, OptionBlock>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parse_and_display() {
        for level in OptionLevel::ALL {
            assert_eq!(level.to_string().parse::<OptionLevel>().unwrap(), level);
        }
        assert!("public".parse::<OptionLevel>().is_err());
    }

    #[test]
    fn hooks_in_order() {
        let titles: Vec<_> = Hook::ALL.iter().map(|h| h.title()).collect();
        assert_eq!(
            titles,
            vec!["pre sources", "post sources", "post target", "post alias"]
        );
    }

    #[test]
    fn absorb_globals_is_union() {
        let mut a = OptionBlock::default();
        a.global_definitions.insert("A=1".to_string());
        let mut b = OptionBlock::default();
        b.global_definitions.insert("A=1".to_string());
        b.global_definitions.insert("B=2".to_string());
        a.absorb_globals(&b);
        assert_eq!(a.global_definitions.len(), 2);
    }
}
