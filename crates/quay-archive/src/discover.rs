//! Source discovery.
//!
//! Resolves a project's declared source entries into the concrete file
//! set that gets archived. Entries that name an existing file are taken
//! literally; everything else is treated as a regular expression and
//! matched against a recursive walk of the project root.

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use quay_model::Project;

use crate::error::{ArchiveError, Result};
use crate::filetype::{check_file_types, is_compiled_source, sniff_mime};

/// Largest acceptable license file.
const MAX_LICENSE_SIZE: u64 = 512 * 1024;

/// Resolve the project's source declarations into `project.files`.
///
/// Also derives `header_only`, validates and includes the license file,
/// and always includes the project manifest.
pub fn find_sources(project: &mut Project, base: &Path) -> Result<()> {
    let root = base.join(&project.root_directory);

    // Literal pass: declared entries that exist are files, the rest are
    // patterns.
    let mut patterns = Vec::new();
    for entry in std::mem::take(&mut project.sources) {
        if root.join(&entry).exists() {
            project.files.insert(PathBuf::from(entry));
        } else {
            patterns.push(entry);
        }
    }

    if patterns.is_empty() && project.files.is_empty() && !project.empty {
        return Err(ArchiveError::NoSources {
            detail: "'files' must be populated".to_string(),
        });
    }

    let compiled: Vec<(String, Regex)> = patterns
        .into_iter()
        .map(|p| {
            Regex::new(&format!("^(?:{p})$"))
                .map(|r| (p.clone(), r))
                .map_err(|e| ArchiveError::InvalidPattern {
                    pattern: p,
                    detail: e.to_string(),
                })
        })
        .collect::<Result<_>>()?;

    if !compiled.is_empty() {
        for entry in WalkDir::new(&root) {
            let entry = entry.map_err(|e| ArchiveError::Io {
                path: root.clone(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&root)
                .unwrap_or(entry.path())
                .display()
                .to_string()
                .replace('\\', "/");
            if compiled.iter().any(|(_, r)| r.is_match(&rel)) {
                project.files.insert(PathBuf::from(rel));
            }
        }
    }

    if project.files.is_empty() && !project.empty {
        return Err(ArchiveError::NoSources {
            detail: "no files found".to_string(),
        });
    }

    check_file_types(&project.files, &root)?;

    project.header_only = !project.files.iter().any(|f| is_compiled_source(f));

    if !project.license.is_empty() {
        let license_path = root.join(&project.license);
        if !license_path.is_file() {
            return Err(ArchiveError::MissingLicense { path: license_path });
        }
        let data = std::fs::read(&license_path).map_err(|e| ArchiveError::Io {
            path: license_path.clone(),
            source: e,
        })?;
        if data.len() as u64 > MAX_LICENSE_SIZE || sniff_mime(&data) != "text/plain" {
            return Err(ArchiveError::InvalidLicense { path: license_path });
        }
        project.files.insert(PathBuf::from(&project.license));
    }

    // The manifest travels with the package. A non-trivial root directory
    // gets its own copy so the archive is self-contained.
    let manifest = PathBuf::from(&project.manifest_filename);
    if !project.root_directory.as_os_str().is_empty() {
        std::fs::copy(base.join(&manifest), root.join(&manifest)).map_err(|e| {
            ArchiveError::Io {
                path: root.join(&manifest),
                source: e,
            }
        })?;
    }
    project.files.insert(manifest);

    tracing::debug!(files = project.files.len(), header_only = project.header_only, "sources resolved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn project() -> Project {
        let mut p = Project::default();
        p.manifest_filename = "quay.toml".to_string();
        p
    }

    fn touch(base: &Path, rel: &str, contents: &[u8]) {
        let path = base.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn literal_entries_and_patterns() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "quay.toml", b"files = []");
        touch(dir.path(), "src/a.c", b"int a;");
        touch(dir.path(), "src/b.c", b"int b;");
        touch(dir.path(), "include/lib.h", b"int l;");
        touch(dir.path(), "docs/notes.txt", b"notes");

        let mut p = project();
        p.sources = ["src/a.c", "src/.*\\.c", "include/.*\\.h"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        find_sources(&mut p, dir.path()).unwrap();

        let expected: BTreeSet<PathBuf> = ["src/a.c", "src/b.c", "include/lib.h", "quay.toml"]
            .iter()
            .map(PathBuf::from)
            .collect();
        assert_eq!(p.files, expected);
        assert!(!p.header_only);
    }

    #[test]
    fn header_only_derived_when_nothing_compiles() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "quay.toml", b"files = []");
        touch(dir.path(), "include/lib.h", b"int l;");
        touch(dir.path(), "include/impl.ipp", b"int i;");

        let mut p = project();
        p.sources.insert("include/.*".to_string());
        find_sources(&mut p, dir.path()).unwrap();
        assert!(p.header_only);
    }

    #[test]
    fn empty_result_is_an_error_unless_empty_project() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "quay.toml", b"files = []");

        let mut p = project();
        p.sources.insert("src/.*\\.c".to_string());
        let err = find_sources(&mut p, dir.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::NoSources { .. }));

        let mut p = project();
        p.sources.insert("src/.*\\.c".to_string());
        p.empty = true;
        find_sources(&mut p, dir.path()).unwrap();
        // Only the manifest.
        assert_eq!(p.files.len(), 1);
    }

    #[test]
    fn no_declared_sources_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "quay.toml", b"files = []");

        let mut p = project();
        let err = find_sources(&mut p, dir.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::NoSources { .. }));
    }

    #[test]
    fn license_must_exist_and_be_small_text() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "quay.toml", b"files = []");
        touch(dir.path(), "src/a.c", b"int a;");

        let mut p = project();
        p.sources.insert("src/a.c".to_string());
        p.license = "LICENSE".to_string();
        let err = find_sources(&mut p, dir.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingLicense { .. }));

        touch(dir.path(), "LICENSE", b"MIT\n");
        let mut p = project();
        p.sources.insert("src/a.c".to_string());
        p.license = "LICENSE".to_string();
        find_sources(&mut p, dir.path()).unwrap();
        assert!(p.files.contains(&PathBuf::from("LICENSE")));
    }

    #[test]
    fn binary_license_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "quay.toml", b"files = []");
        touch(dir.path(), "src/a.c", b"int a;");
        touch(dir.path(), "LICENSE", &[0u8, 1, 2, 3]);

        let mut p = project();
        p.sources.insert("src/a.c".to_string());
        p.license = "LICENSE".to_string();
        let err = find_sources(&mut p, dir.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::InvalidLicense { .. }));
    }

    #[test]
    fn root_directory_scopes_discovery_and_receives_the_manifest() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "quay.toml", b"files = []");
        touch(dir.path(), "vendor/lib/src/a.c", b"int a;");
        touch(dir.path(), "src/outside.c", b"int o;");

        let mut p = project();
        p.root_directory = PathBuf::from("vendor/lib");
        p.sources.insert("src/.*\\.c".to_string());
        find_sources(&mut p, dir.path()).unwrap();

        assert!(p.files.contains(&PathBuf::from("src/a.c")));
        assert!(!p.files.iter().any(|f| f.ends_with("outside.c")));
        // Manifest copied under the root so the archive is self-contained.
        assert!(dir.path().join("vendor/lib/quay.toml").is_file());
    }
}
