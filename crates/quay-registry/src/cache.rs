//! On-disk package cache.
//!
//! Each resolved package occupies one version directory under a storage
//! root, keyed by the package's filesystem path and concrete version.
//!
//! Layout:
//! ```text
//! <storage_root>/
//!   <org>/<name>/
//!     archive.md5       — hash marker for the cached archive
//!     <version>/        — unpacked package contents
//!     <version>.tar.gz  — transient download, removed after unpacking
//! ```
//!
//! A version directory is valid only while the sibling marker equals the
//! hash the resolver declared; an empty hash on either side invalidates
//! the entry. Marker writes are atomic (temp file + rename).

use std::path::{Path, PathBuf};

use quay_model::Dependency;

use crate::error::{RegistryError, Result};

/// Cache location of a single resolved package.
#[derive(Debug, Clone)]
pub struct PackageCache {
    version_dir: PathBuf,
}

impl PackageCache {
    /// Compute the version directory for a dependency under a storage root.
    pub fn locate(root: &Path, dep: &Dependency) -> PathBuf {
        root.join(dep.package.to_fs_path())
            .join(dep.version.to_string())
    }

    /// Address the cache slot a reconciled dependency points at.
    pub fn for_dependency(dep: &Dependency) -> Self {
        PackageCache {
            version_dir: dep.package_dir.clone(),
        }
    }

    /// The unpacked package directory.
    pub fn version_dir(&self) -> &Path {
        &self.version_dir
    }

    /// The hash marker next to the version directory.
    pub fn marker_path(&self) -> PathBuf {
        match self.version_dir.parent() {
            Some(parent) => parent.join("archive.md5"),
            None => PathBuf::from("archive.md5"),
        }
    }

    /// Transient download location for the package archive.
    pub fn archive_path(&self) -> PathBuf {
        let mut name = self.version_dir.as_os_str().to_os_string();
        name.push(".tar.gz");
        PathBuf::from(name)
    }

    /// Whether the cached contents still match the declared hash.
    ///
    /// Missing directory, missing marker, or an empty hash on either side
    /// all invalidate the entry.
    pub fn is_valid(&self, declared_hash: &str) -> bool {
        if declared_hash.is_empty() || !self.version_dir.is_dir() {
            return false;
        }
        match std::fs::read_to_string(self.marker_path()) {
            Ok(stored) => {
                let stored = stored.trim();
                !stored.is_empty() && stored == declared_hash
            }
            Err(_) => false,
        }
    }

    /// Remove a stale version directory whole; partial merges are never
    /// attempted.
    pub fn clear_stale(&self) -> Result<()> {
        if self.version_dir.exists() {
            std::fs::remove_dir_all(&self.version_dir).map_err(|e| RegistryError::Cache {
                path: self.version_dir.clone(),
                detail: format!("removing stale entry: {e}"),
            })?;
        }
        Ok(())
    }

    /// Atomically record the declared hash for the cached archive.
    pub fn write_marker(&self, hash: &str) -> Result<()> {
        let marker = self.marker_path();
        if let Some(parent) = marker.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RegistryError::Cache {
                path: parent.to_path_buf(),
                detail: format!("creating cache dir: {e}"),
            })?;
        }
        let tmp = marker.with_extension("md5.tmp");
        std::fs::write(&tmp, hash).map_err(|e| RegistryError::Cache {
            path: tmp.clone(),
            detail: format!("writing marker: {e}"),
        })?;
        std::fs::rename(&tmp, &marker).map_err(|e| RegistryError::Cache {
            path: marker,
            detail: format!("committing marker: {e}"),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quay_model::{ProjectPath, Version};

    fn dep_at(root: &Path) -> Dependency {
        let mut dep = Dependency::new(ProjectPath::parse("org.zlib").unwrap());
        dep.version = Version::parse("1.2.11").unwrap();
        dep.hash = "abc123".to_string();
        dep.package_dir = PackageCache::locate(root, &dep);
        dep
    }

    #[test]
    fn locate_uses_fs_path_and_version() {
        let dep = dep_at(Path::new("/store"));
        assert_eq!(dep.package_dir, Path::new("/store/org/zlib/1.2.11"));
    }

    #[test]
    fn marker_and_archive_are_siblings() {
        let dep = dep_at(Path::new("/store"));
        let cache = PackageCache::for_dependency(&dep);
        assert_eq!(cache.marker_path(), Path::new("/store/org/zlib/archive.md5"));
        assert_eq!(
            cache.archive_path(),
            Path::new("/store/org/zlib/1.2.11.tar.gz")
        );
    }

    #[test]
    fn valid_only_with_matching_marker() {
        let dir = tempfile::tempdir().unwrap();
        let dep = dep_at(dir.path());
        let cache = PackageCache::for_dependency(&dep);

        // Nothing on disk yet.
        assert!(!cache.is_valid(&dep.hash));

        std::fs::create_dir_all(cache.version_dir()).unwrap();
        assert!(!cache.is_valid(&dep.hash));

        cache.write_marker(&dep.hash).unwrap();
        assert!(cache.is_valid(&dep.hash));

        // A different declared hash invalidates the entry.
        assert!(!cache.is_valid("different"));
        // So does an empty declared hash.
        assert!(!cache.is_valid(""));
    }

    #[test]
    fn empty_stored_marker_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let dep = dep_at(dir.path());
        let cache = PackageCache::for_dependency(&dep);

        std::fs::create_dir_all(cache.version_dir()).unwrap();
        std::fs::create_dir_all(cache.marker_path().parent().unwrap()).unwrap();
        std::fs::write(cache.marker_path(), "").unwrap();
        assert!(!cache.is_valid(&dep.hash));
    }

    #[test]
    fn clear_stale_removes_whole_dir() {
        let dir = tempfile::tempdir().unwrap();
        let dep = dep_at(dir.path());
        let cache = PackageCache::for_dependency(&dep);

        std::fs::create_dir_all(cache.version_dir().join("nested")).unwrap();
        cache.clear_stale().unwrap();
        assert!(!cache.version_dir().exists());

        // Clearing an absent entry is a no-op.
        cache.clear_stale().unwrap();
    }
}
