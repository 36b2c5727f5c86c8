//! Registry client for the quay package manager.
//!
//! Handles the workspace-level dependency resolution round-trip,
//! reconciliation of registry answers against declared constraints, and
//! materialization of resolved packages into the local cache.
//!
//! # Architecture
//!
//! Resolution is one request per workspace, never per package. The
//! returned package table is reconciled against every project's
//! constraint table, then each resolved package is materialized
//! independently: cache-valid packages touch no network, everything else
//! is downloaded, integrity-checked, and unpacked.

pub mod cache;
pub mod error;
pub mod fetch;
pub mod integrity;
pub mod protocol;
pub mod reconcile;
pub mod transport;

// Re-exports for convenience.
pub use cache::PackageCache;
pub use error::{RegistryError, Result};
pub use fetch::{materialize_all, Fetcher};
pub use integrity::ContentHash;
pub use protocol::{build_request, resolve, FindDependenciesResponse, RemotePackage};
pub use reconcile::reconcile;
pub use transport::{DirTransport, Transport};
