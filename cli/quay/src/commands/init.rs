//! `quay init` — project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use quay_model::MANIFEST_FILENAME;

/// Create a new quay project at the given path.
pub fn run(name: &str) -> Result<()> {
    let project_dir = Path::new(name);
    create_project(project_dir, name)
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }

    fs::create_dir_all(project_dir.join("src")).context("creating src/ directory")?;
    fs::create_dir_all(project_dir.join("include"))
        .context("creating include/ directory")?;

    let manifest = manifest_template(name);
    fs::write(project_dir.join(MANIFEST_FILENAME), manifest)
        .with_context(|| format!("writing {MANIFEST_FILENAME}"))?;

    fs::write(project_dir.join(".gitignore"), "quay/\n").context("writing .gitignore")?;

    println!("Created project '{name}'");
    println!("  {name}/{MANIFEST_FILENAME}");
    println!("  {name}/src/");
    println!("  {name}/include/");
    println!("  {name}/.gitignore");

    Ok(())
}

fn manifest_template(name: &str) -> String {
    format!(
        r#"# quay project description
# root_project = "pvt.you.{name}"

files = "src/.*"

[include_directories]
public = ["include"]

# [dependencies]
# "org.zlib" = "1.2"
"#
    )
}
