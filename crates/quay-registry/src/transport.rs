//! Registry transport trait and local directory implementation.
//!
//! The `Transport` trait abstracts the two wire operations resolution
//! needs: a JSON query and an archive download. `DirTransport` is a
//! directory-backed implementation used by tests and local registries.
//!
//! Layout served by `DirTransport`:
//! ```text
//! <root>/
//!   index.json                        — full package table
//!   <data_dir>/<pkg/fs/path>/<version>.tar.gz
//! ```

use std::path::{Path, PathBuf};

use quay_model::DependencyFlags;

use crate::error::{RegistryError, Result};
use crate::integrity::ContentHash;

/// Abstract registry transport.
pub trait Transport {
    /// Send a JSON request and return the parsed JSON answer.
    fn post(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value>;

    /// Download `url` to `dest` and return the content hash of the bytes.
    fn download(&self, url: &str, dest: &Path) -> Result<ContentHash>;
}

/// A local directory-backed registry for development and testing.
pub struct DirTransport {
    root: PathBuf,
}

impl DirTransport {
    /// Serve a registry from the given directory.
    pub fn new(root: PathBuf) -> Self {
        DirTransport { root }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index(&self) -> Result<serde_json::Value> {
        let path = self.root.join("index.json");
        let data = std::fs::read_to_string(&path).map_err(|e| RegistryError::Cache {
            path,
            detail: format!("reading registry index: {e}"),
        })?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl Transport for DirTransport {
    fn post(&self, url: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        if !url.ends_with("/api/find_dependencies") {
            return Err(RegistryError::Download {
                url: url.to_string(),
                detail: "unknown endpoint".to_string(),
            });
        }

        let requested: Vec<String> = body
            .as_object()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();

        let index = self.index()?;
        let table = index["packages"].as_object().cloned().unwrap_or_default();

        // Direct answers: every indexed package at or below a requested path.
        let mut selected = serde_json::Map::new();
        for (path, pkg) in &table {
            let direct = requested
                .iter()
                .any(|r| path == r || path.starts_with(&format!("{r}.")));
            if direct {
                let mut pkg = pkg.clone();
                let mut flags = DependencyFlags::from_bits(pkg["flags"].as_u64().unwrap_or(0));
                flags.direct = true;
                pkg["flags"] = serde_json::json!(flags.bits());
                selected.insert(path.clone(), pkg);
            }
        }

        // Transitive closure via peer ids.
        loop {
            let wanted: Vec<u64> = selected
                .values()
                .flat_map(|p| p["dependencies"].as_array().cloned().unwrap_or_default())
                .filter_map(|v| v.as_u64())
                .collect();
            let missing: Vec<(String, serde_json::Value)> = table
                .iter()
                .filter(|(path, pkg)| {
                    !selected.contains_key(*path)
                        && pkg["id"].as_u64().is_some_and(|id| wanted.contains(&id))
                })
                .map(|(path, pkg)| (path.clone(), pkg.clone()))
                .collect();
            if missing.is_empty() {
                break;
            }
            for (path, mut pkg) in missing {
                let mut flags = DependencyFlags::from_bits(pkg["flags"].as_u64().unwrap_or(0));
                flags.direct = false;
                pkg["flags"] = serde_json::json!(flags.bits());
                selected.insert(path, pkg);
            }
        }

        let data_dir = index["data_dir"].as_str().unwrap_or("data");
        Ok(serde_json::json!({
            "api": 1,
            "data_dir": data_dir,
            "packages": selected,
        }))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<ContentHash> {
        let local = self.root.join(url_path(url));
        let data = std::fs::read(&local).map_err(|e| RegistryError::Download {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
        std::fs::write(dest, &data).map_err(|e| RegistryError::Cache {
            path: dest.to_path_buf(),
            detail: format!("writing download: {e}"),
        })?;
        Ok(ContentHash::compute(&data))
    }
}

/// Strip the scheme and host from a URL, leaving the served path.
fn url_path(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, p)| p).unwrap_or(""),
        None => url.trim_start_matches('/'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_index(root: &Path, packages: serde_json::Value) {
        let index = serde_json::json!({ "data_dir": "data", "packages": packages });
        std::fs::write(root.join("index.json"), index.to_string()).unwrap();
    }

    #[test]
    fn url_path_strips_host() {
        assert_eq!(url_path("https://quay.pm/data/org/zlib/1.2.tar.gz"), "data/org/zlib/1.2.tar.gz");
        assert_eq!(url_path("/data/a.tar.gz"), "data/a.tar.gz");
    }

    #[test]
    fn find_dependencies_marks_direct_and_closes_over_peers() {
        let dir = tempfile::tempdir().unwrap();
        write_index(
            dir.path(),
            serde_json::json!({
                "org.zlib": {"id": 1, "version": "1.2.11", "flags": 0, "md5": "aa", "dependencies": [2]},
                "org.bzip2": {"id": 2, "version": "1.0.6", "flags": 0, "md5": "bb", "dependencies": []},
                "org.unrelated": {"id": 3, "version": "0.1", "flags": 0, "md5": "cc", "dependencies": []},
            }),
        );
        let transport = DirTransport::new(dir.path().to_path_buf());

        let body = serde_json::json!({ "org.zlib": { "version": "*" } });
        let answer = transport
            .post("https://quay.pm/api/find_dependencies", &body)
            .unwrap();

        assert_eq!(answer["api"], 1);
        let packages = answer["packages"].as_object().unwrap();
        assert_eq!(packages.len(), 2);

        let zlib_flags = DependencyFlags::from_bits(packages["org.zlib"]["flags"].as_u64().unwrap());
        assert!(zlib_flags.direct);
        let bzip_flags = DependencyFlags::from_bits(packages["org.bzip2"]["flags"].as_u64().unwrap());
        assert!(!bzip_flags.direct);
    }

    #[test]
    fn subtree_paths_answer_a_parent_request() {
        let dir = tempfile::tempdir().unwrap();
        write_index(
            dir.path(),
            serde_json::json!({
                "org.boost.filesystem": {"id": 1, "version": "1.60", "flags": 0, "md5": "aa", "dependencies": []},
            }),
        );
        let transport = DirTransport::new(dir.path().to_path_buf());

        let body = serde_json::json!({ "org.boost": { "version": "*" } });
        let answer = transport
            .post("https://quay.pm/api/find_dependencies", &body)
            .unwrap();
        assert!(answer["packages"]
            .as_object()
            .unwrap()
            .contains_key("org.boost.filesystem"));
    }

    #[test]
    fn download_hashes_served_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let served = dir.path().join("data");
        std::fs::create_dir_all(&served).unwrap();
        std::fs::write(served.join("a.tar.gz"), b"archive").unwrap();

        let transport = DirTransport::new(dir.path().to_path_buf());
        let dest = dir.path().join("downloaded.tar.gz");
        let hash = transport
            .download("https://quay.pm/data/a.tar.gz", &dest)
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"archive");
        assert_eq!(hash, ContentHash::compute(b"archive"));
    }

    #[test]
    fn missing_archive_is_a_download_error() {
        let dir = tempfile::tempdir().unwrap();
        write_index(dir.path(), serde_json::json!({}));
        let transport = DirTransport::new(dir.path().to_path_buf());

        let dest = dir.path().join("nope.tar.gz");
        let err = transport
            .download("https://quay.pm/data/nope.tar.gz", &dest)
            .unwrap_err();
        assert!(matches!(err, RegistryError::Download { .. }));
    }
}
