//! Workspace meta-descriptor generation.

use quay_model::Config;

use crate::descriptor::{short_id, Subordinate, WorkspaceDescriptor, UMBRELLA_TARGET};

/// Build the workspace descriptor from the resolved configuration.
///
/// Direct packages become build subordinates; transitive-only packages are
/// listed as peers so their cache directories enter the build tree without
/// an umbrella edge. The umbrella target links every non-executable direct
/// package.
pub fn generate_workspace(cfg: &Config) -> WorkspaceDescriptor {
    let mut direct = Vec::new();
    let mut umbrella_links = Vec::new();
    for id in cfg.packages.values() {
        direct.push(Subordinate {
            short_id: short_id(&id.dependency.package_dir),
            source_dir: id.dependency.package_dir.display().to_string(),
        });
        if !id.dependency.flags.executable {
            umbrella_links.push(id.target_name.clone());
        }
    }

    let indirect = cfg
        .indirect_dependencies
        .values()
        .map(|dep| Subordinate {
            short_id: short_id(&dep.package_dir),
            source_dir: dep.package_dir.display().to_string(),
        })
        .collect();

    WorkspaceDescriptor {
        direct,
        indirect,
        umbrella_target: UMBRELLA_TARGET.to_string(),
        umbrella_links,
        export: true,
    }
}
