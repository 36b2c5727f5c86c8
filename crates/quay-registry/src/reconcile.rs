//! Reconciliation of registry answers against declared constraints.
//!
//! Every entry in the returned package table is processed; table order
//! carries no meaning. Direct packages mutate the declaring project's
//! constraint in place, indirect packages accumulate at workspace level
//! and never attach to a project.

use std::collections::BTreeMap;

use regex::Regex;

use quay_model::{
    Config, Dependency, DependencyFlags, PackageId, ProjectPath, ScopeDirs, StorageScope, Version,
};

use crate::cache::PackageCache;
use crate::error::{RegistryError, Result};
use crate::protocol::RemotePackage;

/// Fold a response package table into the workspace configuration.
pub fn reconcile(
    cfg: &mut Config,
    dirs: &ScopeDirs,
    packages: &BTreeMap<String, RemotePackage>,
) -> Result<()> {
    let by_id: BTreeMap<u64, (&String, &RemotePackage)> = packages
        .iter()
        .map(|(path, pkg)| (pkg.id, (path, pkg)))
        .collect();

    let default_scope = cfg.packages_dir;
    let mut registered = Vec::new();

    for (path, remote) in packages {
        let resolved_path = ProjectPath::parse(path)?;
        let version = Version::parse(&remote.version)?;
        let flags = DependencyFlags::from_bits(remote.flags);
        let closure = peer_closure(path, remote, &by_id)?;

        if flags.direct {
            let mut found = false;
            for project in &mut cfg.projects {
                let matched = if project.dependencies.contains_key(path) {
                    project.dependencies.get_mut(path)
                } else {
                    match_by_prefix(&mut project.dependencies, path)?
                };
                let Some(constraint) = matched else { continue };
                found = true;

                // The response entry's path is authoritative: a prefix
                // match means the declared path was only a namespace, and
                // cache location plus derived names follow the resolved
                // package.
                constraint.package = resolved_path.clone();
                constraint.version = version.clone();
                constraint.hash = remote.md5.clone();
                constraint.dependencies = closure.clone();
                // Server flags win except for locally declared privacy.
                constraint.flags.executable = flags.executable;
                constraint.flags.header_only = flags.header_only;
                constraint.flags.direct = true;

                let scope = constraint.storage_scope(default_scope);
                constraint.package_dir = PackageCache::locate(dirs.dir(scope), constraint);
                registered.push(PackageId::new(constraint));
            }
            if !found {
                return Err(RegistryError::UnmatchedPackage {
                    package: path.clone(),
                });
            }
        } else {
            let mut dep = Dependency::new(resolved_path);
            dep.version = version;
            dep.flags = flags;
            dep.hash = remote.md5.clone();
            dep.dependencies = closure;
            dep.package_dir = PackageCache::locate(dirs.dir(StorageScope::User), &dep);
            cfg.indirect_dependencies.insert(path.clone(), dep);
        }
    }

    for id in registered {
        cfg.register_package(id)?;
    }
    Ok(())
}

/// Prefix-pattern fallback: each constraint path compiled as a regex
/// `path + ".*"`, first full match wins. The first-match policy means a
/// returned subtree package resolves to whichever matching constraint
/// sorts first; that ambiguity is deliberate.
fn match_by_prefix<'a>(
    constraints: &'a mut BTreeMap<String, Dependency>,
    path: &str,
) -> Result<Option<&'a mut Dependency>> {
    let mut key = None;
    for declared in constraints.keys() {
        let pattern = Regex::new(&format!("^{declared}.*$")).map_err(|e| {
            RegistryError::Protocol {
                detail: format!("constraint '{declared}' is not a valid pattern: {e}"),
            }
        })?;
        if pattern.is_match(path) {
            key = Some(declared.clone());
            break;
        }
    }
    Ok(key.and_then(move |k| constraints.get_mut(&k)))
}

/// Rebuild a package's transitive closure by copying the referenced peer
/// entries by value.
fn peer_closure(
    path: &str,
    remote: &RemotePackage,
    by_id: &BTreeMap<u64, (&String, &RemotePackage)>,
) -> Result<BTreeMap<String, Dependency>> {
    let mut closure = BTreeMap::new();
    for id in &remote.dependencies {
        let (peer_path, peer) = by_id.get(id).ok_or_else(|| RegistryError::UnknownPeer {
            package: path.to_string(),
            id: *id,
        })?;
        let mut dep = Dependency::new(ProjectPath::parse(peer_path)?);
        dep.version = Version::parse(&peer.version)?;
        dep.flags = DependencyFlags::from_bits(peer.flags);
        dep.hash = peer.md5.clone();
        closure.insert((*peer_path).clone(), dep);
    }
    Ok(closure)
}
