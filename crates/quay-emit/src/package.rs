//! Per-package descriptor generation.
//!
//! Runs against a materialized package's own configuration (re-loaded
//! from its cache directory) plus the resolved dependency fact the
//! workspace holds for it. Checks and global definitions fold upward
//! into the workspace aggregate as a side effect.

use std::collections::BTreeMap;

use quay_model::{Config, Dependency, Hook, PackageId, Project, Visibility};

use crate::descriptor::{
    Guard, HookInsertions, Insertion, LibraryKind, LinkEdge, OptionDirectives, PackageDescriptor,
    ScopedPaths, SourceStrategy, TargetKind, HELPER_TARGET,
};
use crate::error::{EmitError, Result};

/// Workspace-level library kind policy.
///
/// Precedence, highest first: project `static_only`/`shared_only`, then
/// the per-package override keyed by variable name, then the global
/// shared toggle, then static.
#[derive(Debug, Clone, Default)]
pub struct KindPolicy {
    /// Global shared/static toggle.
    pub build_shared: bool,
    /// Per-package overrides keyed by the package's variable name.
    pub overrides: BTreeMap<String, LibraryKind>,
}

impl KindPolicy {
    fn resolve(&self, id: &PackageId, project: &Project) -> LibraryKind {
        if project.static_only {
            return LibraryKind::Static;
        }
        if project.shared_only {
            return LibraryKind::Shared;
        }
        if let Some(kind) = self.overrides.get(&id.variable_name) {
            return *kind;
        }
        if self.build_shared {
            LibraryKind::Shared
        } else {
            LibraryKind::Static
        }
    }
}

/// Generate the build descriptor for one materialized package.
///
/// `ws` is the consuming workspace's aggregate, `pkg_cfg` the package's
/// own configuration, `fact` the resolved dependency the workspace holds
/// for it.
pub fn generate_package(
    ws: &mut Config,
    pkg_cfg: &Config,
    fact: &Dependency,
    policy: &KindPolicy,
) -> Result<PackageDescriptor> {
    let id = PackageId::new(fact);
    let header_only = fact.flags.header_only;
    let project = owning_project(pkg_cfg, fact)?;

    gather_checks(ws, pkg_cfg);

    let kind = if fact.flags.executable {
        TargetKind::Executable
    } else if header_only {
        TargetKind::Interface
    } else {
        TargetKind::Library(policy.resolve(&id, project))
    };

    let sources = match kind {
        TargetKind::Interface => None,
        _ if project.build_files.is_empty() => Some(SourceStrategy::GlobRecursive),
        _ => Some(SourceStrategy::Explicit(
            project
                .build_files
                .iter()
                .map(|f| f.replace('\\', "/"))
                .collect(),
        )),
    };

    let mut include_directories = ScopedPaths::default();
    for dir in &project.include_directories.public {
        let dir = dir.display().to_string();
        if header_only {
            include_directories.interface.push(dir);
        } else {
            include_directories.public.push(dir);
        }
    }
    if !header_only {
        for dir in &project.include_directories.private {
            include_directories.private.push(dir.display().to_string());
        }
    }

    let link_edges = link_edges(project, fact, header_only);
    let options = lower_options(ws, project, header_only);
    let aliases = aliases(fact);
    let hooks = hooks(pkg_cfg, project);

    tracing::debug!(package = %fact.package, target = %id.target_name, "descriptor generated");

    Ok(PackageDescriptor {
        package: fact.package.to_string(),
        version: fact.version.to_string(),
        target_name: id.target_name,
        kind,
        sources,
        exclude_from_build: project
            .exclude_from_build
            .iter()
            .map(|f| f.display().to_string().replace('\\', "/"))
            .collect(),
        include_directories,
        link_edges,
        options,
        aliases,
        hooks,
        export: true,
    })
}

/// The project that owns the requested package: the sole declared
/// project, or the exact package-path match.
fn owning_project<'a>(pkg_cfg: &'a Config, fact: &Dependency) -> Result<&'a Project> {
    match pkg_cfg.projects.len() {
        0 => Err(EmitError::NoProjects {
            package: fact.package.to_string(),
        }),
        1 => Ok(&pkg_cfg.projects[0]),
        _ => pkg_cfg
            .find_project(&fact.package)
            .ok_or_else(|| EmitError::MissingProject {
                package: fact.package.to_string(),
            }),
    }
}

/// Union the package's check registries into the workspace aggregate.
fn gather_checks(ws: &mut Config, pkg_cfg: &Config) {
    ws.check_functions
        .extend(pkg_cfg.check_functions.iter().cloned());
    ws.check_includes
        .extend(pkg_cfg.check_includes.iter().cloned());
    ws.check_types.extend(pkg_cfg.check_types.iter().cloned());
    ws.check_libraries
        .extend(pkg_cfg.check_libraries.iter().cloned());
    for (symbol, headers) in &pkg_cfg.check_symbols {
        ws.check_symbols
            .entry(symbol.clone())
            .or_default()
            .extend(headers.iter().cloned());
    }
}

fn link_edges(project: &Project, fact: &Dependency, header_only: bool) -> Vec<LinkEdge> {
    let mut edges = Vec::new();
    // Every package links the workspace helper.
    edges.push(LinkEdge {
        target: HELPER_TARGET.to_string(),
        visibility: if header_only {
            Visibility::Interface
        } else {
            Visibility::Public
        },
    });

    for (name, sub) in &project.dependencies {
        // The resolved fact knows which sub-dependencies are executables;
        // those are never link targets.
        if fact
            .dependencies
            .get(name)
            .is_some_and(|d| d.flags.executable)
        {
            continue;
        }
        let visibility = if header_only {
            Visibility::Interface
        } else if sub.flags.private {
            Visibility::Private
        } else {
            Visibility::Public
        };
        edges.push(LinkEdge {
            target: PackageId::new(sub).target_name,
            visibility,
        });
    }
    edges
}

/// Lower option blocks into guarded directives, hoisting global
/// definitions into the workspace aggregate.
fn lower_options(ws: &mut Config, project: &Project, header_only: bool) -> Vec<OptionDirectives> {
    let mut lowered = Vec::new();
    for (level, block) in &project.options {
        if !block.global_definitions.is_empty() {
            ws.global_options
                .entry(*level)
                .or_default()
                .absorb_globals(block);
        }

        let definitions = block
            .definitions
            .iter()
            .map(|(vis, def)| {
                let vis = if header_only { Visibility::Interface } else { *vis };
                (vis, def.clone())
            })
            .collect();
        let visibility = if header_only {
            Visibility::Interface
        } else {
            Visibility::Public
        };
        lowered.push(OptionDirectives {
            guard: Guard::from(*level),
            visibility,
            definitions,
            include_directories: block.include_directories.iter().cloned().collect(),
            link_directories: block.link_directories.iter().cloned().collect(),
            link_libraries: block.link_libraries.iter().cloned().collect(),
        });
    }
    lowered
}

/// Three aliases for numbered versions, none for branches: most specific
/// first.
fn aliases(fact: &Dependency) -> Vec<String> {
    if fact.version.is_branch() {
        return Vec::new();
    }
    let base = fact.package.to_string();
    vec![
        format!("{base}-{}", fact.version.without_patch().to_any_string()),
        format!("{base}-{}", fact.version.without_minor().to_any_string()),
        base,
    ]
}

/// Collect the insertions for every hook point in emission order:
/// package-config level (multi-project configs only), owning project,
/// then each option level under its guard.
fn hooks(pkg_cfg: &Config, project: &Project) -> Vec<HookInsertions> {
    let mut all = Vec::new();
    for hook in Hook::ALL {
        let mut insertions = Vec::new();
        if pkg_cfg.projects.len() > 1 {
            let text = pkg_cfg.insertions.hook(hook);
            if !text.is_empty() {
                insertions.push(Insertion {
                    guard: Guard::Always,
                    text: text.to_string(),
                });
            }
        }
        let text = project.insertions.hook(hook);
        if !text.is_empty() {
            insertions.push(Insertion {
                guard: Guard::Always,
                text: text.to_string(),
            });
        }
        for (level, block) in &project.options {
            let text = block.insertions.hook(hook);
            if !text.is_empty() {
                insertions.push(Insertion {
                    guard: Guard::from(*level),
                    text: text.to_string(),
                });
            }
        }
        all.push(HookInsertions { hook, insertions });
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use quay_model::{DependencyFlags, OptionLevel, ProjectPath, Version};
    use std::path::PathBuf;

    fn fact(path: &str, version: &str, flags: DependencyFlags) -> Dependency {
        let mut dep = Dependency::new(ProjectPath::parse(path).unwrap());
        dep.version = Version::parse(version).unwrap();
        dep.flags = flags;
        dep
    }

    fn single_project_cfg() -> Config {
        let mut cfg = Config::default();
        cfg.projects.push(Project::default());
        cfg
    }

    #[test]
    fn static_library_by_default() {
        let mut ws = Config::default();
        let pkg_cfg = single_project_cfg();
        let f = fact("org.zlib", "1.2.11", DependencyFlags::default());

        let desc = generate_package(&mut ws, &pkg_cfg, &f, &KindPolicy::default()).unwrap();
        assert_eq!(desc.target_name, "org.zlib-1.2.11");
        assert_eq!(desc.kind, TargetKind::Library(LibraryKind::Static));
        assert_eq!(desc.sources, Some(SourceStrategy::GlobRecursive));
        assert!(desc.export);
    }

    #[test]
    fn kind_precedence() {
        let f = fact("org.zlib", "1.2.11", DependencyFlags::default());
        let id = PackageId::new(&f);

        // Global toggle.
        let policy = KindPolicy {
            build_shared: true,
            ..KindPolicy::default()
        };
        assert_eq!(policy.resolve(&id, &Project::default()), LibraryKind::Shared);

        // Per-package override beats the toggle.
        let mut policy = KindPolicy {
            build_shared: true,
            ..KindPolicy::default()
        };
        policy
            .overrides
            .insert(id.variable_name.clone(), LibraryKind::Static);
        assert_eq!(policy.resolve(&id, &Project::default()), LibraryKind::Static);

        // Project flags beat everything.
        let mut project = Project::default();
        project.shared_only = true;
        let policy = KindPolicy::default();
        assert_eq!(policy.resolve(&id, &project), LibraryKind::Shared);
    }

    #[test]
    fn executable_and_interface_kinds() {
        let mut ws = Config::default();
        let pkg_cfg = single_project_cfg();

        let mut flags = DependencyFlags::default();
        flags.executable = true;
        let desc = generate_package(
            &mut ws,
            &pkg_cfg,
            &fact("org.tool", "1.0", flags),
            &KindPolicy::default(),
        )
        .unwrap();
        assert_eq!(desc.kind, TargetKind::Executable);

        let mut flags = DependencyFlags::default();
        flags.header_only = true;
        let desc = generate_package(
            &mut ws,
            &pkg_cfg,
            &fact("org.header", "1.0", flags),
            &KindPolicy::default(),
        )
        .unwrap();
        assert_eq!(desc.kind, TargetKind::Interface);
        assert!(desc.sources.is_none());
    }

    #[test]
    fn header_only_folds_everything_to_interface() {
        let mut ws = Config::default();
        let mut pkg_cfg = Config::default();
        let mut project = Project::default();
        project
            .include_directories
            .public
            .insert(PathBuf::from("include"));
        project.options.entry(OptionLevel::Any).or_default().definitions.insert((Visibility::Public, "FOO=1".to_string()));
        pkg_cfg.projects.push(project);

        let mut flags = DependencyFlags::default();
        flags.header_only = true;
        let desc = generate_package(
            &mut ws,
            &pkg_cfg,
            &fact("org.header", "1.0", flags),
            &KindPolicy::default(),
        )
        .unwrap();

        assert_eq!(desc.include_directories.interface, vec!["include"]);
        assert!(desc.include_directories.public.is_empty());
        assert_eq!(
            desc.options[0].definitions,
            vec![(Visibility::Interface, "FOO=1".to_string())]
        );
        assert_eq!(desc.options[0].visibility, Visibility::Interface);
        assert_eq!(desc.link_edges[0].visibility, Visibility::Interface);
    }

    #[test]
    fn option_lists_are_public_for_compiled_targets() {
        let mut ws = Config::default();
        let mut pkg_cfg = Config::default();
        let mut project = Project::default();
        let block = project.options.entry(OptionLevel::Any).or_default();
        block.include_directories.insert("vendor/include".to_string());
        block.link_libraries.insert("pthread".to_string());
        pkg_cfg.projects.push(project);

        let desc = generate_package(
            &mut ws,
            &pkg_cfg,
            &fact("org.lib", "1.0", DependencyFlags::default()),
            &KindPolicy::default(),
        )
        .unwrap();

        assert_eq!(desc.options[0].visibility, Visibility::Public);
        assert_eq!(desc.options[0].include_directories, vec!["vendor/include"]);
        assert_eq!(desc.options[0].link_libraries, vec!["pthread"]);
    }

    #[test]
    fn private_dependencies_stay_private() {
        let mut ws = Config::default();
        let mut pkg_cfg = Config::default();
        let mut project = Project::default();
        let mut private_dep = Dependency::new(ProjectPath::parse("org.secret").unwrap());
        private_dep.version = Version::parse("2.0").unwrap();
        private_dep.flags.private = true;
        project
            .dependencies
            .insert("org.secret".to_string(), private_dep);
        pkg_cfg.projects.push(project);

        let desc = generate_package(
            &mut ws,
            &pkg_cfg,
            &fact("org.lib", "1.0", DependencyFlags::default()),
            &KindPolicy::default(),
        )
        .unwrap();

        let edge = desc
            .link_edges
            .iter()
            .find(|e| e.target == "org.secret-2.0")
            .unwrap();
        assert_eq!(edge.visibility, Visibility::Private);
    }

    #[test]
    fn executable_sub_dependencies_are_not_linked() {
        let mut ws = Config::default();
        let mut pkg_cfg = Config::default();
        let mut project = Project::default();
        project.dependencies.insert(
            "org.codegen".to_string(),
            Dependency::new(ProjectPath::parse("org.codegen").unwrap()),
        );
        pkg_cfg.projects.push(project);

        let mut f = fact("org.lib", "1.0", DependencyFlags::default());
        let mut tool = Dependency::new(ProjectPath::parse("org.codegen").unwrap());
        tool.flags.executable = true;
        f.dependencies.insert("org.codegen".to_string(), tool);

        let desc =
            generate_package(&mut ws, &pkg_cfg, &f, &KindPolicy::default()).unwrap();
        assert!(!desc
            .link_edges
            .iter()
            .any(|e| e.target.starts_with("org.codegen")));
        // The helper edge is always present.
        assert_eq!(desc.link_edges[0].target, HELPER_TARGET);
    }

    #[test]
    fn branch_versions_get_no_aliases() {
        let mut ws = Config::default();
        let pkg_cfg = single_project_cfg();

        let desc = generate_package(
            &mut ws,
            &pkg_cfg,
            &fact("org.zlib", "master", DependencyFlags::default()),
            &KindPolicy::default(),
        )
        .unwrap();
        assert!(desc.aliases.is_empty());
    }

    #[test]
    fn numbered_versions_get_three_aliases() {
        let mut ws = Config::default();
        let pkg_cfg = single_project_cfg();

        let desc = generate_package(
            &mut ws,
            &pkg_cfg,
            &fact("org.zlib", "1.2.11", DependencyFlags::default()),
            &KindPolicy::default(),
        )
        .unwrap();
        assert_eq!(
            desc.aliases,
            vec!["org.zlib-1.2", "org.zlib-1", "org.zlib"]
        );
    }

    #[test]
    fn checks_and_globals_fold_into_workspace() {
        let mut ws = Config::default();
        let mut pkg_cfg = Config::default();
        pkg_cfg.check_functions.insert("memmem".to_string());
        pkg_cfg
            .check_symbols
            .entry("snprintf".to_string())
            .or_default()
            .insert("stdio.h".to_string());
        let mut project = Project::default();
        project
            .options
            .entry(OptionLevel::Shared)
            .or_default()
            .global_definitions
            .insert("BUILDING_SHARED=1".to_string());
        pkg_cfg.projects.push(project);

        generate_package(
            &mut ws,
            &pkg_cfg,
            &fact("org.lib", "1.0", DependencyFlags::default()),
            &KindPolicy::default(),
        )
        .unwrap();

        assert!(ws.check_functions.contains("memmem"));
        assert!(ws.check_symbols["snprintf"].contains("stdio.h"));
        assert!(ws.global_options[&OptionLevel::Shared]
            .global_definitions
            .contains("BUILDING_SHARED=1"));
    }

    #[test]
    fn hook_order_is_config_project_levels() {
        let mut ws = Config::default();
        let mut pkg_cfg = Config::default();
        pkg_cfg.insertions.post_target = "config-level".to_string();
        let mut p1 = Project::default();
        p1.package = ProjectPath::parse("org.a").unwrap();
        p1.insertions.post_target = "project-level".to_string();
        p1.options
            .entry(OptionLevel::Static)
            .or_default()
            .insertions
            .post_target = "static-level".to_string();
        pkg_cfg.projects.push(p1);
        let mut p2 = Project::default();
        p2.package = ProjectPath::parse("org.b").unwrap();
        pkg_cfg.projects.push(p2);

        let desc = generate_package(
            &mut ws,
            &pkg_cfg,
            &fact("org.a", "1.0", DependencyFlags::default()),
            &KindPolicy::default(),
        )
        .unwrap();

        let post_target = desc
            .hooks
            .iter()
            .find(|h| h.hook == Hook::PostTarget)
            .unwrap();
        let texts: Vec<_> = post_target.insertions.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["config-level", "project-level", "static-level"]);
        assert_eq!(post_target.insertions[2].guard, Guard::StaticOnly);
    }

    #[test]
    fn multi_project_config_requires_exact_match() {
        let mut ws = Config::default();
        let mut pkg_cfg = Config::default();
        let mut p1 = Project::default();
        p1.package = ProjectPath::parse("org.a").unwrap();
        pkg_cfg.projects.push(p1);
        let mut p2 = Project::default();
        p2.package = ProjectPath::parse("org.b").unwrap();
        pkg_cfg.projects.push(p2);

        let err = generate_package(
            &mut ws,
            &pkg_cfg,
            &fact("org.missing", "1.0", DependencyFlags::default()),
            &KindPolicy::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EmitError::MissingProject { .. }));
    }

    #[test]
    fn explicit_build_files_are_ordered() {
        let mut ws = Config::default();
        let mut pkg_cfg = Config::default();
        let mut project = Project::default();
        project.build_files.insert("src/a.c".to_string());
        project.build_files.insert("src/b.c".to_string());
        project.exclude_from_build.insert(PathBuf::from("src/skip.c"));
        pkg_cfg.projects.push(project);

        let desc = generate_package(
            &mut ws,
            &pkg_cfg,
            &fact("org.lib", "1.0", DependencyFlags::default()),
            &KindPolicy::default(),
        )
        .unwrap();
        assert_eq!(
            desc.sources,
            Some(SourceStrategy::Explicit(vec![
                "src/a.c".to_string(),
                "src/b.c".to_string()
            ]))
        );
        assert_eq!(desc.exclude_from_build, vec!["src/skip.c"]);
    }
}
