//! Package archives.
//!
//! Archives are deterministic: exactly the resolved file set, in sorted
//! order, regular files only, mode 0644, zeroed timestamps. The same
//! file set always produces the same bytes, so archive hashes are
//! stable.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use quay_model::Project;

use crate::error::{ArchiveError, Result};
use crate::filetype::check_filename;

/// Write the project's resolved file set as a gzip tarball.
///
/// Missing files are skipped and reported through the `false` return
/// value rather than aborting; prohibited filename characters fail the
/// whole operation before any archiving work starts.
pub fn pack(project: &Project, base: &Path, dest: &Path) -> Result<bool> {
    check_filenames(&project.files)?;

    let root = base.join(&project.root_directory);
    let out = std::fs::File::create(dest).map_err(|e| ArchiveError::Io {
        path: dest.to_path_buf(),
        source: e,
    })?;
    let mut builder = tar::Builder::new(GzEncoder::new(out, Compression::default()));

    let mut success = true;
    for file in &project.files {
        let real = root.join(file);
        if !real.is_file() {
            tracing::warn!(file = %real.display(), "skipping missing file");
            success = false;
            continue;
        }
        let data = std::fs::read(&real).map_err(|e| ArchiveError::Io {
            path: real.clone(),
            source: e,
        })?;

        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(0);
        header.set_entry_type(tar::EntryType::Regular);
        header.set_cksum();

        let name = file.display().to_string().replace('\\', "/");
        builder
            .append_data(&mut header, &name, data.as_slice())
            .map_err(|e| ArchiveError::Io {
                path: real,
                source: e,
            })?;
    }

    builder
        .into_inner()
        .and_then(|gz| gz.finish())
        .map_err(|e| ArchiveError::Io {
            path: dest.to_path_buf(),
            source: e,
        })?;
    Ok(success)
}

fn check_filenames(files: &BTreeSet<PathBuf>) -> Result<()> {
    let mut report = String::new();
    for file in files {
        let name = file.display().to_string().replace('\\', "/");
        if !check_filename(&name) {
            report.push_str(&format!("File '{name}' has prohibited symbols\n"));
        }
    }
    if report.is_empty() {
        Ok(())
    } else {
        Err(ArchiveError::FileChecks { report })
    }
}

/// Extract a gzip tarball into a destination directory, guarding against
/// path traversal.
pub fn unpack(archive: &Path, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest).map_err(|e| ArchiveError::Io {
        path: dest.to_path_buf(),
        source: e,
    })?;

    let file = std::fs::File::open(archive).map_err(|e| ArchiveError::Io {
        path: archive.to_path_buf(),
        source: e,
    })?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));

    let entries = tar.entries().map_err(|e| ArchiveError::Io {
        path: archive.to_path_buf(),
        source: e,
    })?;
    for entry in entries {
        let mut entry = entry.map_err(|e| ArchiveError::Io {
            path: archive.to_path_buf(),
            source: e,
        })?;
        let name = entry
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        // unpack_in refuses entries that would land outside dest.
        let unpacked = entry.unpack_in(dest).map_err(|e| ArchiveError::Io {
            path: dest.join(&name),
            source: e,
        })?;
        if !unpacked {
            return Err(ArchiveError::Traversal { entry: name });
        }
    }
    Ok(())
}
