//! Backend-agnostic build descriptors.
//!
//! Plain-data descriptions of targets, link edges, scoped directives,
//! and insertion hooks. Nothing here knows about a concrete build
//! system; rendering is a separate concern.

use std::path::Path;

use sha2::{Digest, Sha256};

use quay_model::{Hook, Visibility};

/// Name of the synthetic umbrella target linking all direct packages.
pub const UMBRELLA_TARGET: &str = "quay";

/// Name of the workspace helper target carrying checks and global
/// definitions.
pub const HELPER_TARGET: &str = "quay-helpers";

/// How a library target is linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    Static,
    Shared,
}

impl LibraryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryKind::Static => "static",
            LibraryKind::Shared => "shared",
        }
    }
}

/// What kind of target a package builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Executable,
    Library(LibraryKind),
    /// Header-only: no compiled translation units.
    Interface,
}

/// Condition under which a directive applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Always,
    StaticOnly,
    SharedOnly,
}

impl From<quay_model::OptionLevel> for Guard {
    fn from(level: quay_model::OptionLevel) -> Self {
        match level {
            quay_model::OptionLevel::Any => Guard::Always,
            quay_model::OptionLevel::Static => Guard::StaticOnly,
            quay_model::OptionLevel::Shared => Guard::SharedOnly,
        }
    }
}

/// How a target's source list is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStrategy {
    /// Exactly these files, in order.
    Explicit(Vec<String>),
    /// Recursive glob over the package directory.
    GlobRecursive,
}

/// Include directories split by visibility.
#[derive(Debug, Clone, Default)]
pub struct ScopedPaths {
    pub public: Vec<String>,
    pub private: Vec<String>,
    pub interface: Vec<String>,
}

impl ScopedPaths {
    pub fn is_empty(&self) -> bool {
        self.public.is_empty() && self.private.is_empty() && self.interface.is_empty()
    }
}

/// One link dependency of a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEdge {
    pub target: String,
    pub visibility: Visibility,
}

/// Raw insertion text with its applicability guard.
#[derive(Debug, Clone)]
pub struct Insertion {
    pub guard: Guard,
    pub text: String,
}

/// The insertions attached to one hook point, in emission order.
#[derive(Debug, Clone)]
pub struct HookInsertions {
    pub hook: Hook,
    pub insertions: Vec<Insertion>,
}

/// Directives attached to one option level, lowered with their guard.
#[derive(Debug, Clone)]
pub struct OptionDirectives {
    pub guard: Guard,
    /// Scope for the directory and library lists; definitions carry
    /// their own visibility per entry.
    pub visibility: Visibility,
    pub definitions: Vec<(Visibility, String)>,
    pub include_directories: Vec<String>,
    pub link_directories: Vec<String>,
    pub link_libraries: Vec<String>,
}

/// Everything a build system needs to know about one package.
#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    pub package: String,
    pub version: String,
    pub target_name: String,
    pub kind: TargetKind,
    /// `None` for interface targets, which compile nothing.
    pub sources: Option<SourceStrategy>,
    pub exclude_from_build: Vec<String>,
    pub include_directories: ScopedPaths,
    pub link_edges: Vec<LinkEdge>,
    pub options: Vec<OptionDirectives>,
    /// Alias target names, most specific first.
    pub aliases: Vec<String>,
    pub hooks: Vec<HookInsertions>,
    pub export: bool,
}

/// One materialized package directory, keyed for the build tree.
#[derive(Debug, Clone)]
pub struct Subordinate {
    /// Six-hex-char id derived from the cache location.
    pub short_id: String,
    pub source_dir: String,
}

/// The workspace meta-descriptor tying all packages together.
#[derive(Debug, Clone)]
pub struct WorkspaceDescriptor {
    pub direct: Vec<Subordinate>,
    pub indirect: Vec<Subordinate>,
    pub umbrella_target: String,
    /// Targets the umbrella links, non-executable direct packages only.
    pub umbrella_links: Vec<String>,
    pub export: bool,
}

/// One platform probe and the variable it binds.
#[derive(Debug, Clone)]
pub struct CheckDirective {
    /// Probe family, e.g. `check_function_exists`.
    pub probe: &'static str,
    /// What is being probed: function, include, type, library, symbol.
    pub input: String,
    /// Headers a symbol probe looks in.
    pub headers: Vec<String>,
    /// Result variable, `HAVE_`-style.
    pub variable: String,
}

/// Derived size bindings for a type check.
#[derive(Debug, Clone)]
pub struct SizeBinding {
    pub source: String,
    pub size_of: String,
    pub sizeof: String,
}

/// The aggregated helper descriptor: checks, conditional definitions,
/// and the helper interface target.
#[derive(Debug, Clone)]
pub struct ChecksDescriptor {
    pub checks: Vec<CheckDirective>,
    pub size_bindings: Vec<SizeBinding>,
    /// Endianness result variable and its aliases.
    pub endianness_variable: String,
    pub endianness_aliases: Vec<String>,
    /// Per-condition interface definitions on the helper target.
    pub conditional_definitions: Vec<(String, Vec<String>)>,
    pub helper_target: String,
    /// Global definitions hoisted from every package's option levels.
    pub global_definitions: Vec<String>,
    /// Manifest file whose change re-runs resolution.
    pub rerun_on: String,
}

/// Six-hex-char build-tree id for a materialized package directory.
///
/// Keyed on the last two path components (package name and version) so
/// the id is stable across storage roots.
pub fn short_id(package_dir: &Path) -> String {
    let version = package_dir
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = package_dir
        .parent()
        .and_then(|p| p.file_name())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(format!("{name}/{version}").as_bytes());
    let digest = hasher.finalize();
    digest
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<String>()[..6]
        .to_string()
}
