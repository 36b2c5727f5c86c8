//! Source file-type validation.
//!
//! Published packages may contain only recognizable source material.
//! A file passes when its sniffed MIME type is on the allow-list or its
//! extension is a known header/source extension. Validation collects
//! every violation into one report before failing, so an author sees the
//! full list at once.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{ArchiveError, Result};

/// MIME types accepted as package source material.
pub const SOURCE_MIME_TYPES: &[&str] = &[
    "text/x-asm",
    "text/x-c",
    "text/x-c++",
    "text/plain",
    "text/html",
    "text/tex",
];

/// Header file extensions.
pub const HEADER_FILE_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "h++", "HPP"];

/// Compiled translation unit extensions.
pub const SOURCE_FILE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "c++", "CPP"];

/// Other accepted source extensions.
pub const OTHER_SOURCE_FILE_EXTENSIONS: &[&str] = &["s", "S", "asm", "ipp"];

/// Whether the extension alone marks an accepted source file.
pub fn is_allowed_file_extension(path: &Path) -> bool {
    let Some(ext) = extension(path) else {
        return false;
    };
    HEADER_FILE_EXTENSIONS.contains(&ext)
        || SOURCE_FILE_EXTENSIONS.contains(&ext)
        || OTHER_SOURCE_FILE_EXTENSIONS.contains(&ext)
}

/// Whether the file is a compiled translation unit.
///
/// A project with no compiled sources is header-only.
pub fn is_compiled_source(path: &Path) -> bool {
    extension(path).is_some_and(|ext| SOURCE_FILE_EXTENSIONS.contains(&ext))
}

/// Extension matching is case-sensitive: `.CPP` is accepted, `.Cpp` is
/// not.
fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}

/// Whether a filename carries only permitted characters.
pub fn check_filename(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+'))
}

/// Sniff a MIME type from the file's leading bytes: printable UTF-8 is
/// plain text, anything else is opaque binary.
pub fn sniff_mime(data: &[u8]) -> &'static str {
    let probe = &data[..data.len().min(8192)];
    match std::str::from_utf8(probe) {
        Ok(s) if !s.contains('\0') => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Validate every file of a project, collecting all violations into a
/// single multi-line report.
pub fn check_file_types(files: &BTreeSet<std::path::PathBuf>, root: &Path) -> Result<()> {
    if files.is_empty() {
        return Ok(());
    }

    let mut report = String::new();
    for file in files {
        let display = root.join(file).display().to_string();
        if !check_filename(&display.replace('\\', "/")) {
            report.push_str(&format!("File '{display}' has prohibited symbols\n"));
        }
    }
    if !report.is_empty() {
        return Err(ArchiveError::FileChecks { report });
    }

    for file in files {
        let full = root.join(file);
        let data = std::fs::read(&full).map_err(|e| ArchiveError::Io {
            path: full.clone(),
            source: e,
        })?;
        let mime = sniff_mime(&data);
        let ok = SOURCE_MIME_TYPES.contains(&mime) || is_allowed_file_extension(file);
        if !ok {
            report.push_str(&format!(
                "not supported: {}, mime: {mime}\n",
                full.display()
            ));
        }
    }
    if !report.is_empty() {
        return Err(ArchiveError::FileChecks { report });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extension_classification() {
        assert!(is_allowed_file_extension(Path::new("a.h")));
        assert!(is_allowed_file_extension(Path::new("a.hpp")));
        assert!(is_allowed_file_extension(Path::new("a.cpp")));
        assert!(is_allowed_file_extension(Path::new("a.ipp")));
        assert!(is_allowed_file_extension(Path::new("a.CPP")));
        assert!(!is_allowed_file_extension(Path::new("a.rs")));
        assert!(!is_allowed_file_extension(Path::new("a")));
    }

    #[test]
    fn compiled_source_excludes_headers() {
        assert!(is_compiled_source(Path::new("src/a.c")));
        assert!(is_compiled_source(Path::new("src/a.cxx")));
        assert!(!is_compiled_source(Path::new("include/a.h")));
        assert!(!is_compiled_source(Path::new("a.ipp")));
    }

    #[test]
    fn filename_symbols() {
        assert!(check_filename("src/sub-dir/file_name.c++"));
        assert!(!check_filename("src/a file.c"));
        assert!(!check_filename("src/naïve.c"));
    }

    #[test]
    fn mime_sniffing() {
        assert_eq!(sniff_mime(b"int main() { return 0; }\n"), "text/plain");
        assert_eq!(sniff_mime(&[0x7f, b'E', b'L', b'F', 0, 0]), "application/octet-stream");
    }

    #[test]
    fn violations_are_aggregated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.c"), b"int a;").unwrap();
        std::fs::write(dir.path().join("bad1.bin"), [0u8, 159, 146]).unwrap();
        std::fs::write(dir.path().join("bad2.bin"), [255u8, 0, 1]).unwrap();

        let files: BTreeSet<PathBuf> = ["good.c", "bad1.bin", "bad2.bin"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let err = check_file_types(&files, dir.path()).unwrap_err();
        let report = err.to_string();
        assert!(report.contains("bad1.bin"));
        assert!(report.contains("bad2.bin"));
        assert!(!report.contains("good.c"));
    }

    #[test]
    fn text_without_known_extension_passes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README"), b"docs\n").unwrap();
        let files: BTreeSet<PathBuf> = [PathBuf::from("README")].into_iter().collect();
        check_file_types(&files, dir.path()).unwrap();
    }
}
