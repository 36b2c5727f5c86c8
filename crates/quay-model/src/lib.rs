//! Typed data model for the quay package manager.
//!
//! Everything downstream (the config mapper, the registry client, the
//! build descriptor generator) operates on the types defined here. The
//! model itself performs no I/O; it is constructed by `quay-schema` from a
//! structured project description and mutated by `quay-registry` as
//! dependencies are resolved.

pub mod config;
pub mod dependency;
pub mod error;
pub mod options;
pub mod path;
pub mod project;
pub mod version;

// Re-exports for convenience.
pub use config::{Config, Proxy, ScopeDirs, StorageScope, LOCAL_DIR, MANIFEST_FILENAME};
pub use dependency::{Dependency, DependencyFlags, PackageId};
pub use error::{ModelError, Result};
pub use options::{Hook, Insertions, OptionBlock, OptionLevel, Options, Visibility};
pub use path::ProjectPath;
pub use project::{IncludeDirectories, Project};
pub use version::Version;
