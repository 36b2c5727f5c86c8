//! Dependency records and derived package naming.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::StorageScope;
use crate::path::ProjectPath;
use crate::version::Version;

/// Capability flags carried by a dependency, round-tripping through the
/// registry's integer bitset.
///
/// Bit layout: 0 = private, 1 = executable, 2 = header-only, 3 = direct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependencyFlags {
    /// Consumed privately by the declaring project; must not leak into a
    /// consumer's public link scope.
    pub private: bool,
    /// The package builds an executable; never a link target.
    pub executable: bool,
    /// No compiled translation units; interface-only.
    pub header_only: bool,
    /// Explicitly declared by a workspace project.
    pub direct: bool,
}

impl DependencyFlags {
    /// Decode from the wire integer.
    pub fn from_bits(bits: u64) -> Self {
        DependencyFlags {
            private: bits & 1 != 0,
            executable: bits & 2 != 0,
            header_only: bits & 4 != 0,
            direct: bits & 8 != 0,
        }
    }

    /// Encode to the wire integer.
    pub fn bits(&self) -> u64 {
        (self.private as u64)
            | (self.executable as u64) << 1
            | (self.header_only as u64) << 2
            | (self.direct as u64) << 3
    }
}

/// One package dependency: a constraint when declared, a resolved fact once
/// the registry has answered.
///
/// Resolution mutates the declared constraint in place (version and resolved
/// cache directory); it never creates a duplicate key.
#[derive(Debug, Clone, Default)]
pub struct Dependency {
    /// Absolute package path.
    pub package: ProjectPath,
    /// Declared constraint, then the resolved concrete version.
    pub version: Version,
    /// Capability flags.
    pub flags: DependencyFlags,
    /// Resolved on-disk version directory (set during reconciliation).
    pub package_dir: PathBuf,
    /// Per-dependency cache scope override.
    pub package_dir_scope: Option<StorageScope>,
    /// Transitive closure, copied by value from the registry response.
    /// Owned snapshot with no back-references; read-only after resolution.
    pub dependencies: BTreeMap<String, Dependency>,
    /// Ordered patch references.
    pub patches: Vec<String>,
    /// Content hash of the package archive as declared by the resolver
    /// (wire key `md5`).
    pub hash: String,
}

impl Dependency {
    /// Create a constraint for a package path with the default (any) version.
    pub fn new(package: ProjectPath) -> Self {
        Dependency {
            package,
            ..Dependency::default()
        }
    }

    /// The cache scope this dependency materializes under, given the
    /// workspace default.
    pub fn storage_scope(&self, default: StorageScope) -> StorageScope {
        self.package_dir_scope.unwrap_or(default)
    }
}

/// Derived, identifier-safe names for one resolved (package, version) pair.
///
/// Never persisted. Two distinct pairs must never collide after derivation;
/// a collision is a defect in the naming scheme, not a recoverable
/// condition.
#[derive(Debug, Clone)]
pub struct PackageId {
    /// The dependency fact this identity was derived from.
    pub dependency: Dependency,
    /// Build target name, e.g. `org.lib-1.2.0`.
    pub target_name: String,
    /// Identifier-safe variable name, e.g. `org_lib__1_2_0`.
    pub variable_name: String,
}

impl PackageId {
    /// Derive names from a dependency fact.
    pub fn new(dependency: &Dependency) -> Self {
        let v = dependency.version.to_any_string();
        let base = dependency.package.to_string();
        let target_name = if v == "*" {
            base.clone()
        } else {
            format!("{base}-{v}")
        };
        let variable_raw = if v == "*" {
            format!("{base}_")
        } else {
            format!("{base}___{v}")
        };
        let variable_name = variable_raw
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        PackageId {
            dependency: dependency.clone(),
            target_name,
            variable_name,
        }
    }
}
