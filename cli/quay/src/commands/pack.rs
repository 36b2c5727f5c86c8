//! `quay pack` — source discovery and archive creation.

use std::path::Path;

use anyhow::{bail, Context, Result};
use quay_model::MANIFEST_FILENAME;

/// Collect a project's sources into a distributable archive.
pub fn run(dir: &Path, output: Option<&Path>) -> Result<()> {
    let manifest = dir.join(MANIFEST_FILENAME);
    let cfg = quay_schema::load_file(&manifest)
        .with_context(|| format!("loading {}", manifest.display()))?;

    let mut archived = 0;
    for mut project in cfg.projects {
        quay_archive::find_sources(&mut project, dir).with_context(|| {
            format!("collecting sources for '{}'", project_label(&project))
        })?;

        let default_name = format!("{}.tar.gz", project_label(&project));
        let dest = match output {
            Some(path) => path.to_path_buf(),
            None => dir.join(default_name),
        };
        tracing::info!(
            project = %project_label(&project),
            files = project.files.len(),
            dest = %dest.display(),
            "packing sources"
        );
        let complete = quay_archive::pack(&project, dir, &dest)
            .with_context(|| format!("packing '{}'", project_label(&project)))?;
        if !complete {
            bail!(
                "archive {} is incomplete: some listed files are missing",
                dest.display()
            );
        }
        println!("Packed {} file(s) into {}", project.files.len(), dest.display());
        archived += 1;
    }

    if archived == 0 {
        bail!("no projects to pack");
    }
    Ok(())
}

fn project_label(project: &quay_model::Project) -> String {
    project
        .package
        .segments()
        .last()
        .cloned()
        .unwrap_or_else(|| "package".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_workspace(dir: &Path, manifest: &str, files: &[(&str, &str)]) {
        std::fs::write(dir.join("quay.toml"), manifest).unwrap();
        for (name, content) in files {
            let path = dir.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
    }

    #[test]
    fn pack_produces_an_unpackable_archive() {
        let dir = tempfile::tempdir().unwrap();
        write_workspace(
            dir.path(),
            "files = \"src/.*\"",
            &[("src/lib.c", "int f;\n"), ("src/lib.h", "int f;\n")],
        );

        let dest = dir.path().join("out.tar.gz");
        run(dir.path(), Some(&dest)).unwrap();
        assert!(dest.is_file());

        let unpacked = dir.path().join("unpacked");
        quay_archive::unpack(&dest, &unpacked).unwrap();
        assert!(unpacked.join("src/lib.c").is_file());
        assert!(unpacked.join("quay.toml").is_file());
    }

    #[test]
    fn pack_without_matching_sources_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_workspace(dir.path(), "files = \"src/.*\"", &[]);

        let result = run(dir.path(), None);
        assert!(result.is_err());
    }
}
