//! The aggregate configuration root.
//!
//! A `Config` is constructed once per project root, loaded from the
//! structured description, mutated by the resolver as dependencies are
//! fetched, consumed by the generator, then discarded. It is not persisted
//! beyond the generated descriptors and the on-disk cache.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::dependency::{Dependency, PackageId};
use crate::error::{ModelError, Result};
use crate::options::Options;
use crate::path::ProjectPath;
use crate::project::Project;

/// Name of the project description file.
pub const MANIFEST_FILENAME: &str = "quay.toml";

/// Name of the local package directory inside a workspace.
pub const LOCAL_DIR: &str = "quay";

/// Where a direct dependency's cache directory lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum StorageScope {
    /// Inside the workspace's own `quay/` directory.
    Local,
    /// The per-user storage root.
    #[default]
    User,
    /// The machine-wide storage root.
    System,
}

impl FromStr for StorageScope {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(StorageScope::Local),
            "user" => Ok(StorageScope::User),
            "system" => Ok(StorageScope::System),
            _ => Err(ModelError::UnknownStorageScope {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StorageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageScope::Local => "local",
            StorageScope::User => "user",
            StorageScope::System => "system",
        };
        write!(f, "{s}")
    }
}

/// Concrete cache roots for each storage scope, resolved by the caller from
/// the layered user/system configuration.
#[derive(Debug, Clone, Default)]
pub struct ScopeDirs {
    pub local: PathBuf,
    pub user: PathBuf,
    pub system: PathBuf,
}

impl ScopeDirs {
    /// Resolve the three cache roots for a workspace.
    pub fn resolve(workspace: &Path, cfg: &Config) -> Self {
        ScopeDirs {
            local: workspace.join(LOCAL_DIR).join("packages"),
            user: cfg.storage_dir.clone(),
            system: PathBuf::from("/var/lib/quay/packages"),
        }
    }

    /// Look up the cache root for a scope.
    pub fn dir(&self, scope: StorageScope) -> &PathBuf {
        match scope {
            StorageScope::Local => &self.local,
            StorageScope::User => &self.user,
            StorageScope::System => &self.system,
        }
    }
}

/// Outbound proxy settings.
#[derive(Debug, Clone, Default)]
pub struct Proxy {
    pub host: String,
    pub user: String,
}

/// The aggregate root: workspace settings, projects, check registries, and
/// the resolver's accumulated output.
#[derive(Debug, Clone)]
pub struct Config {
    /// Registry host.
    pub host: String,
    /// Default storage root for cached packages.
    pub storage_dir: PathBuf,
    /// Outbound proxy.
    pub proxy: Proxy,
    /// Default cache scope for direct dependencies.
    pub packages_dir: StorageScope,
    /// Prefix for resolving relative dependency names.
    pub root_project: Option<ProjectPath>,
    /// Projects in declaration order.
    pub projects: Vec<Project>,

    // Platform/feature check registries, aggregated workspace-wide during
    // generation.
    pub check_functions: BTreeSet<String>,
    pub check_includes: BTreeSet<String>,
    pub check_types: BTreeSet<String>,
    pub check_libraries: BTreeSet<String>,
    pub check_symbols: BTreeMap<String, BTreeSet<String>>,

    /// Direct packages materialized so far, keyed by package path.
    pub packages: BTreeMap<String, PackageId>,
    /// Transitive-only packages, keyed by package path.
    pub indirect_dependencies: BTreeMap<String, Dependency>,
    /// Global option blocks hoisted from package option levels.
    pub global_options: Options,
    /// Workspace-level build-system insertions.
    pub insertions: crate::options::Insertions,
    /// Raw registry response, kept for diagnostics.
    pub dependency_tree: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut check_types = BTreeSet::new();
        // Built-in checks every workspace gets.
        check_types.insert("size_t".to_string());
        check_types.insert("void *".to_string());

        Config {
            host: "https://quay.pm".to_string(),
            storage_dir: default_storage_dir(),
            proxy: Proxy::default(),
            packages_dir: StorageScope::User,
            root_project: None,
            projects: Vec::new(),
            check_functions: BTreeSet::new(),
            check_includes: BTreeSet::new(),
            check_types,
            check_libraries: BTreeSet::new(),
            check_symbols: BTreeMap::new(),
            packages: BTreeMap::new(),
            indirect_dependencies: BTreeMap::new(),
            global_options: Options::new(),
            insertions: crate::options::Insertions::default(),
            dependency_tree: None,
        }
    }
}

impl Config {
    /// Resolve a possibly-relative dependency name against the configured
    /// root project.
    ///
    /// The error is raised here rather than at a use site so that every
    /// loader path reports the same condition.
    pub fn relative_name_to_absolute(&self, name: &str) -> Result<ProjectPath> {
        let path = ProjectPath::parse(name)?;
        if !path.is_relative() {
            return Ok(path);
        }
        match &self.root_project {
            Some(root) => Ok(root.join(&path)),
            None => Err(ModelError::InvalidPath {
                path: name.to_string(),
                detail: "relative name used but 'root_project' is not set".to_string(),
            }),
        }
    }

    /// Look up a project by exact package path.
    pub fn find_project(&self, package: &ProjectPath) -> Option<&Project> {
        self.projects.iter().find(|p| &p.package == package)
    }

    /// Register a materialized direct package, rejecting derived-name
    /// collisions between distinct (package, version) pairs.
    pub fn register_package(&mut self, id: PackageId) -> Result<()> {
        let key = id.dependency.package.to_string();
        if let Some(existing) = self.packages.values().find(|p| {
            p.target_name == id.target_name && p.dependency.package != id.dependency.package
        }) {
            return Err(ModelError::NameCollision {
                target_name: existing.target_name.clone(),
            });
        }
        self.packages.insert(key, id);
        Ok(())
    }
}

/// The per-user quay root (`~/.quay`).
pub fn quay_root() -> PathBuf {
    home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".quay")
}

/// Default storage root for cached packages.
pub fn default_storage_dir() -> PathBuf {
    quay_root().join("packages")
}

/// Path of the per-user configuration file.
pub fn user_config_path() -> PathBuf {
    quay_root().join("config.toml")
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
