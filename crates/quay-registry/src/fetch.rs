//! Per-dependency materialization.
//!
//! Each reconciled dependency walks a fixed sequence: locate the cache
//! slot, short-circuit when the cached contents still match the declared
//! hash, otherwise remove the stale directory whole, download the
//! archive, verify its hash, commit the marker, and unpack. Any failure
//! removes the partial directory before propagating; nothing half-built
//! is ever left behind, and already-committed packages stay intact.

use std::path::PathBuf;

use quay_model::Dependency;

use crate::cache::PackageCache;
use crate::error::{RegistryError, Result};
use crate::transport::Transport;

/// Downloads and unpacks resolved packages into the cache.
pub struct Fetcher<'a> {
    transport: &'a dyn Transport,
    host: String,
    data_dir: String,
}

impl<'a> Fetcher<'a> {
    /// Create a fetcher for a registry host and its archive directory.
    pub fn new(transport: &'a dyn Transport, host: &str, data_dir: &str) -> Self {
        Fetcher {
            transport,
            host: host.trim_end_matches('/').to_string(),
            data_dir: data_dir.to_string(),
        }
    }

    /// Ensure the dependency's version directory holds verified contents.
    ///
    /// Returns the unpacked package directory. Cache-valid dependencies
    /// perform no network call.
    pub fn materialize(&self, dep: &Dependency) -> Result<PathBuf> {
        let cache = PackageCache::for_dependency(dep);
        let version_dir = cache.version_dir().to_path_buf();

        if cache.is_valid(&dep.hash) {
            tracing::debug!(package = %dep.package, version = %dep.version, "cache valid");
            return Ok(version_dir);
        }

        cache.clear_stale()?;
        if let Some(parent) = version_dir.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RegistryError::Cache {
                path: parent.to_path_buf(),
                detail: format!("creating cache dir: {e}"),
            })?;
        }

        let url = self.archive_url(dep);
        tracing::info!(package = %dep.package, version = %dep.version, "downloading");
        let archive = cache.archive_path();
        let actual = self.transport.download(&url, &archive)?;

        if actual.as_str() != dep.hash {
            let _ = std::fs::remove_file(&archive);
            return Err(RegistryError::IntegrityFailure {
                package: dep.package.to_string(),
                expected: dep.hash.clone(),
                actual: actual.to_string(),
            });
        }

        cache.write_marker(&dep.hash)?;

        tracing::info!(package = %dep.package, version = %dep.version, "unpacking");
        if let Err(e) = quay_archive::unpack(&archive, &version_dir) {
            // The marker was committed before unpacking; a partial
            // unpack must not look cache-valid on the next run.
            let _ = std::fs::remove_dir_all(&version_dir);
            let _ = std::fs::remove_file(cache.marker_path());
            let _ = std::fs::remove_file(&archive);
            return Err(e.into());
        }
        std::fs::remove_file(&archive).map_err(|e| RegistryError::Cache {
            path: archive,
            detail: format!("removing archive: {e}"),
        })?;

        Ok(version_dir)
    }

    fn archive_url(&self, dep: &Dependency) -> String {
        let fs_path = dep
            .package
            .to_fs_path()
            .display()
            .to_string()
            .replace('\\', "/");
        format!(
            "{}/{}/{}/{}.tar.gz",
            self.host, self.data_dir, fs_path, dep.version
        )
    }
}

/// Materialize a set of dependencies with a bounded worker pool.
///
/// Distinct packages share no mutable state and the marker commit is
/// atomic, so workers never observe a half-written cache entry. Results
/// come back in input order; the first failure is reported after all
/// in-flight work has drained, leaving already-committed packages intact.
pub fn materialize_all(
    transport: &(dyn Transport + Sync),
    host: &str,
    data_dir: &str,
    deps: &[Dependency],
    workers: usize,
) -> Result<Vec<PathBuf>> {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    let workers = workers.clamp(1, deps.len().max(1));
    let next = AtomicUsize::new(0);
    let done: Mutex<Vec<(usize, Result<PathBuf>)>> = Mutex::new(Vec::with_capacity(deps.len()));

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                let fetcher = Fetcher::new(transport, host, data_dir);
                loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(dep) = deps.get(i) else { break };
                    let result = fetcher.materialize(dep);
                    done.lock().unwrap().push((i, result));
                }
            });
        }
    });

    let mut results = done.into_inner().unwrap();
    results.sort_by_key(|(i, _)| *i);
    results.into_iter().map(|(_, r)| r).collect()
}
