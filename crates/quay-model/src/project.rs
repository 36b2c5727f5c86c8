//! One buildable unit within a workspace.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::dependency::Dependency;
use crate::options::{Insertions, Options};
use crate::path::ProjectPath;

/// Include directories split by visibility.
#[derive(Debug, Clone, Default)]
pub struct IncludeDirectories {
    pub public: BTreeSet<PathBuf>,
    pub private: BTreeSet<PathBuf>,
}

impl IncludeDirectories {
    pub fn is_empty(&self) -> bool {
        self.public.is_empty() && self.private.is_empty()
    }
}

/// A single buildable project: sources, dependencies, and build options.
#[derive(Debug, Clone, Default)]
pub struct Project {
    /// Absolute package path of this project.
    pub package: ProjectPath,
    /// Name of the project description file packaged with the sources.
    pub manifest_filename: String,
    /// Directory the sources live under, relative to the workspace root.
    pub root_directory: PathBuf,
    /// Concrete files selected for packaging (resolved from `sources`).
    pub files: BTreeSet<PathBuf>,
    /// Source patterns still awaiting discovery (literal paths or regexes).
    pub sources: BTreeSet<String>,
    /// Explicit ordered build-file set; empty means "glob everything".
    pub build_files: BTreeSet<String>,
    /// Files removed from the build after source collection.
    pub exclude_from_build: BTreeSet<PathBuf>,
    /// Include directories by visibility.
    pub include_directories: IncludeDirectories,
    /// Declared dependencies, keyed by absolute package path.
    pub dependencies: BTreeMap<String, Dependency>,
    /// Per-level option blocks.
    pub options: Options,
    /// Raw build-system insertions for this project.
    pub insertions: Insertions,
    /// License file, relative to the project root.
    pub license: String,
    /// Derived during source discovery: no compiled translation units.
    pub header_only: bool,
    /// Forced static linkage. Mutually exclusive with `shared_only`,
    /// enforced at load time.
    pub static_only: bool,
    /// Forced shared linkage.
    pub shared_only: bool,
    /// An intentionally file-less project (metadata only).
    pub empty: bool,
}
