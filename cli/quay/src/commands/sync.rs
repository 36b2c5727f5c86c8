//! `quay sync` — resolve, materialize, and generate build descriptors.
//!
//! Resolution is one round-trip. Materialization fans out over a bounded
//! worker pool; generation then runs serially, since every package folds
//! checks and global definitions into the shared workspace aggregate.
//! A failed dependency aborts the run; packages committed to the cache
//! before the failure stay intact.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use quay_emit::descriptor::short_id;
use quay_emit::{
    generate_checks, generate_package, generate_workspace, write_descriptor, KindPolicy,
};
use quay_model::{Config, ScopeDirs, LOCAL_DIR, MANIFEST_FILENAME};
use quay_registry::{materialize_all, DirTransport, Transport};

/// Synthetic host the fetcher uses with a directory transport. The
/// transport strips the scheme and host before resolving against its
/// root, so only the path part matters.
const DIR_HOST: &str = "file://registry";

pub fn run(dir: &Path, shared: bool) -> Result<()> {
    let manifest = dir.join(MANIFEST_FILENAME);
    let user = quay_schema::load_user_config().context("loading user configuration")?;
    let mut cfg = quay_schema::load_file(&manifest)
        .with_context(|| format!("loading {}", manifest.display()))?;
    layer_defaults(&mut cfg, &user);

    let transport = open_transport(&cfg.host)?;
    sync_workspace(dir, &mut cfg, &transport, shared)
}

/// Carry host and storage settings from the user configuration when the
/// project description leaves them at their defaults.
fn layer_defaults(cfg: &mut Config, user: &Config) {
    let defaults = Config::default();
    if cfg.host == defaults.host {
        cfg.host = user.host.clone();
    }
    if cfg.storage_dir == defaults.storage_dir {
        cfg.storage_dir = user.storage_dir.clone();
    }
}

/// The HTTP client is an external collaborator; this build reaches
/// registries through the directory transport only.
fn open_transport(host: &str) -> Result<DirTransport> {
    let root = host.strip_prefix("file://").unwrap_or(host);
    let path = Path::new(root);
    if !path.is_dir() {
        bail!(
            "registry host '{host}' is not a local directory; \
             point 'host' at a directory or file:// registry"
        );
    }
    Ok(DirTransport::new(path.to_path_buf()))
}

pub(crate) fn sync_workspace(
    dir: &Path,
    cfg: &mut Config,
    transport: &(dyn Transport + Sync),
    shared: bool,
) -> Result<()> {
    let dirs = ScopeDirs::resolve(dir, cfg);
    let out = dir.join(LOCAL_DIR);

    let data_dir = quay_registry::resolve(cfg, &dirs, transport)
        .context("resolving dependencies")?;

    if let Some(data_dir) = data_dir {
        let policy = KindPolicy {
            build_shared: shared,
            ..KindPolicy::default()
        };

        let mut deps: Vec<_> = cfg.packages.values().map(|p| p.dependency.clone()).collect();
        deps.extend(cfg.indirect_dependencies.values().cloned());
        let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
        tracing::info!(
            packages = deps.len(),
            workers,
            "materializing dependencies"
        );
        let package_dirs = materialize_all(transport, DIR_HOST, &data_dir, &deps, workers)
            .context("materializing dependencies")?;

        for (dep, pkg_dir) in deps.iter().zip(&package_dirs) {
            let pkg_cfg = quay_schema::load_file(&pkg_dir.join(MANIFEST_FILENAME))
                .with_context(|| format!("loading description of {}", dep.package))?;
            tracing::debug!(package = %dep.package, dir = %pkg_dir.display(), "generating descriptor");
            let desc = generate_package(cfg, &pkg_cfg, dep, &policy)
                .with_context(|| format!("generating descriptor for {}", dep.package))?;
            write_descriptor(&out.join(descriptor_filename(pkg_dir)), &desc)
                .with_context(|| format!("writing descriptor for {}", dep.package))?;
        }
    }

    let ws = generate_workspace(cfg);
    write_descriptor(&out.join("workspace.quay"), &ws).context("writing workspace descriptor")?;
    let checks = generate_checks(cfg);
    write_descriptor(&out.join("checks.quay"), &checks).context("writing checks descriptor")?;

    println!(
        "Synced {} package(s), {} peer(s)",
        cfg.packages.len(),
        cfg.indirect_dependencies.len()
    );
    Ok(())
}

/// Descriptor file name for a materialized package, keyed by its build
/// subordinate id so the workspace descriptor can find it.
fn descriptor_filename(package_dir: &Path) -> PathBuf {
    PathBuf::from(format!("{}.quay", short_id(package_dir)))
}
