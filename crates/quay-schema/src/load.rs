//! Typed loaders: project descriptions and layered configuration files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use toml::Value;

use quay_model::{
    Config, Dependency, Insertions, OptionBlock, OptionLevel, Project, Version, Visibility,
    MANIFEST_FILENAME,
};

use crate::error::{Result, SchemaError};
use crate::value::{
    classify, get, get_bool, get_insertion, get_map, get_scalar, get_sequence, get_sequence_set,
    scalar_to_string, sequence_of, Variety,
};

/// Machine-wide configuration file consulted before the user config.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/quay/config.toml";

/// Parse a complete project description from a string.
pub fn load_config_str(s: &str) -> Result<Config> {
    let root: Value = s.parse()?;
    load_config_node(&root)
}

/// Build a `Config` from a parsed document tree.
///
/// The `projects` key is a map of name to project; in its absence the
/// document root itself describes a single anonymous project.
pub fn load_config_node(root: &Value) -> Result<Config> {
    let mut cfg = Config::default();
    load_common(&mut cfg, root)?;

    match get(root, "projects") {
        Some(Value::Table(projects)) => {
            for (name, node) in projects {
                let mut project = load_project(&cfg, node)?;
                project.package = cfg.relative_name_to_absolute(name)?;
                project.manifest_filename = MANIFEST_FILENAME.to_string();
                cfg.projects.push(project);
            }
        }
        Some(_) => {
            return Err(SchemaError::WrongKind {
                key: "projects".to_string(),
                expected: "map",
            })
        }
        None => {
            let mut project = load_project(&cfg, root)?;
            project.package = cfg.relative_name_to_absolute("")?;
            project.manifest_filename = MANIFEST_FILENAME.to_string();
            cfg.projects.push(project);
        }
    }

    Ok(cfg)
}

/// Load the workspace-level keys shared by project descriptions and
/// user/system configuration files.
fn load_common(cfg: &mut Config, root: &Value) -> Result<()> {
    let host = get_scalar(root, "host", "")?;
    if !host.is_empty() {
        cfg.host = host;
    }
    let storage_dir = get_scalar(root, "storage_dir", "")?;
    if !storage_dir.is_empty() {
        cfg.storage_dir = PathBuf::from(storage_dir);
    }
    let root_project = get_scalar(root, "root_project", "")?;
    if !root_project.is_empty() {
        cfg.root_project = Some(quay_model::ProjectPath::parse(&root_project)?);
    }

    if let Some(proxy) = get_map(root, "proxy")? {
        let proxy_node = Value::Table(proxy.clone());
        cfg.proxy.host = get_scalar(&proxy_node, "host", "")?;
        cfg.proxy.user = get_scalar(&proxy_node, "user", "")?;
    }

    cfg.packages_dir = get_scalar(root, "packages_dir", "user")?.parse()?;

    cfg.check_functions
        .extend(get_sequence(root, "check_function_exists")?);
    cfg.check_includes
        .extend(get_sequence(root, "check_include_exists")?);
    cfg.check_types.extend(get_sequence(root, "check_type_size")?);
    cfg.check_libraries
        .extend(get_sequence(root, "check_library_exists")?);

    if let Some(symbols) = get_map(root, "check_symbol_exists")? {
        for (symbol, headers) in symbols {
            let set = cfg.check_symbols.entry(symbol.clone()).or_default();
            match classify(headers) {
                Variety::Scalar(v) => {
                    set.insert(scalar_to_string(symbol, v)?);
                }
                Variety::Sequence(_) => {
                    set.extend(sequence_of(symbol, headers)?);
                }
                Variety::Map(_) => {
                    return Err(SchemaError::WrongKind {
                        key: symbol.clone(),
                        expected: "scalar or sequence",
                    })
                }
            }
        }
    }

    cfg.insertions = load_insertions(root)?;
    Ok(())
}

/// Load a single project from its description node.
pub fn load_project(cfg: &Config, root: &Value) -> Result<Project> {
    let mut p = Project::default();

    p.empty = get_bool(root, "empty")?;
    p.static_only = get_bool(root, "static_only")?;
    p.shared_only = get_bool(root, "shared_only")?;
    if p.static_only && p.shared_only {
        return Err(SchemaError::ExclusiveLinkage);
    }

    p.license = get_scalar(root, "license", "")?;

    let root_directory = get_scalar(root, "root_directory", "")?;
    if !root_directory.is_empty() {
        let dir = PathBuf::from(&root_directory);
        if dir.is_absolute() || dir.components().any(|c| c.as_os_str() == "..") {
            return Err(SchemaError::RootEscape {
                dir: root_directory,
            });
        }
        p.root_directory = dir;
    }

    if let Some(includes) = get_map(root, "include_directories")? {
        let includes_node = Value::Table(includes.clone());
        p.include_directories.public = get_sequence_set(&includes_node, "public")?
            .into_iter()
            .map(PathBuf::from)
            .collect();
        p.include_directories.private = get_sequence_set(&includes_node, "private")?
            .into_iter()
            .map(PathBuf::from)
            .collect();
    }
    if p.include_directories.public.is_empty() {
        p.include_directories.public.insert(PathBuf::from("include"));
    }

    p.exclude_from_build = get_sequence_set(root, "exclude_from_build")?
        .into_iter()
        .map(PathBuf::from)
        .collect();

    p.insertions = load_insertions(root)?;

    if let Some(options) = get_map(root, "options")? {
        for (level_str, level_node) in options {
            let level: OptionLevel = level_str.parse().map_err(SchemaError::Model)?;
            if !level_node.is_table() {
                return Err(SchemaError::WrongKind {
                    key: level_str.clone(),
                    expected: "map",
                });
            }
            let block = load_option_block(level_node)?;
            p.options.insert(level, block);
        }
    }

    load_dependencies(cfg, &mut p, root)?;

    read_sources(root, "files", &mut p.sources)?;
    read_sources(root, "build", &mut p.build_files)?;

    Ok(p)
}

fn load_option_block(node: &Value) -> Result<OptionBlock> {
    let mut block = OptionBlock::default();

    if let Some(defs) = get(node, "definitions") {
        for (vis, key) in [
            (Visibility::Public, "public"),
            (Visibility::Private, "private"),
            (Visibility::Interface, "interface"),
        ] {
            for def in get_sequence(defs, key)? {
                block.definitions.insert((vis, def));
            }
        }
    }

    block.include_directories = get_sequence_set(node, "include_directories")?;
    block.link_directories = get_sequence_set(node, "link_directories")?;
    block.link_libraries = get_sequence_set(node, "link_libraries")?;
    block.global_definitions = get_sequence_set(node, "global_definitions")?;
    block.insertions = load_insertions(node)?;

    Ok(block)
}

/// Load the `dependencies` field in any of its three surface forms:
/// a single name, a list of names, or a map.
fn load_dependencies(cfg: &Config, p: &mut Project, root: &Value) -> Result<()> {
    let Some(node) = get(root, "dependencies") else {
        return Ok(());
    };

    match classify(node) {
        Variety::Scalar(v) => {
            let name = scalar_to_string("dependencies", v)?;
            let dep = Dependency::new(cfg.relative_name_to_absolute(&name)?);
            p.dependencies.insert(dep.package.to_string(), dep);
        }
        Variety::Sequence(items) => {
            for item in items {
                let name = scalar_to_string("dependencies", item)?;
                let dep = Dependency::new(cfg.relative_name_to_absolute(&name)?);
                p.dependencies.insert(dep.package.to_string(), dep);
            }
        }
        Variety::Map(table) => {
            let mut private = BTreeMap::new();
            if let Some(entries) = get_map(node, "private")? {
                for (name, detail) in entries {
                    load_dependency_entry(cfg, &mut private, name, detail)?;
                }
            }
            if let Some(entries) = get_map(node, "public")? {
                for (name, detail) in entries {
                    load_dependency_entry(cfg, &mut p.dependencies, name, detail)?;
                }
            }

            let had_private = !private.is_empty();
            for (key, mut dep) in private {
                dep.flags.private = true;
                p.dependencies.entry(key).or_insert(dep);
            }

            // Neither visibility key produced anything: reinterpret the
            // map as the flat `{name: version-or-detail}` form.
            if p.dependencies.is_empty() && !had_private && !table.is_empty() {
                for (name, detail) in table {
                    load_dependency_entry(cfg, &mut p.dependencies, name, detail)?;
                }
            }
        }
    }

    Ok(())
}

/// Load one `{name: version-or-detail}` dependency entry.
fn load_dependency_entry(
    cfg: &Config,
    deps: &mut BTreeMap<String, Dependency>,
    name: &str,
    detail: &Value,
) -> Result<()> {
    let mut dep = Dependency::new(cfg.relative_name_to_absolute(name)?);

    match classify(detail) {
        Variety::Scalar(v) => {
            dep.version = Version::parse(&scalar_to_string(name, v)?)?;
        }
        Variety::Map(table) => {
            for (key, value) in table {
                match key.as_str() {
                    "version" => {
                        dep.version = Version::parse(&scalar_to_string(key, value)?)?;
                    }
                    "package_dir" => {
                        dep.package_dir_scope = Some(scalar_to_string(key, value)?.parse()?);
                    }
                    "patches" => {
                        dep.patches = sequence_of(key, value)?;
                    }
                    _ => {
                        return Err(SchemaError::UnknownKey {
                            key: key.clone(),
                            dependency: name.to_string(),
                        })
                    }
                }
            }
        }
        Variety::Sequence(_) => {
            return Err(SchemaError::WrongKind {
                key: name.to_string(),
                expected: "scalar or map",
            })
        }
    }

    deps.insert(dep.package.to_string(), dep);
    Ok(())
}

/// Load a source group field (`files` or `build`): scalar, sequence, or a
/// map of named groups where each group is a sequence or a
/// `{root, files}` map.
fn read_sources(
    root: &Value,
    key: &str,
    out: &mut std::collections::BTreeSet<String>,
) -> Result<()> {
    let Some(node) = get(root, key) else {
        return Ok(());
    };

    match classify(node) {
        Variety::Scalar(v) => {
            out.insert(scalar_to_string(key, v)?);
        }
        Variety::Sequence(items) => {
            for item in items {
                out.insert(scalar_to_string(key, item)?);
            }
        }
        Variety::Map(groups) => {
            for (group_name, group) in groups {
                match classify(group) {
                    Variety::Scalar(_) => {
                        return Err(SchemaError::WrongKind {
                            key: group_name.clone(),
                            expected: "sequence or map",
                        })
                    }
                    Variety::Sequence(_) => {
                        out.extend(sequence_of(group_name, group)?);
                    }
                    Variety::Map(_) => {
                        let group_root = get_scalar(group, "root", "")?;
                        for file in get_sequence(group, "files")? {
                            if group_root.is_empty() {
                                out.insert(file);
                            } else {
                                out.insert(format!("{group_root}/{file}"));
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn load_insertions(node: &Value) -> Result<Insertions> {
    Ok(Insertions {
        pre_sources: get_insertion(node, "pre_sources")?,
        post_sources: get_insertion(node, "post_sources")?,
        post_target: get_insertion(node, "post_target")?,
        post_alias: get_insertion(node, "post_alias")?,
    })
}

/// Load a project description from a file.
pub fn load_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_config_str(&content)
}

/// Load the machine-wide configuration, or defaults when absent.
pub fn load_system_config() -> Result<Config> {
    load_layered_config(Path::new(SYSTEM_CONFIG_PATH), Config::default())
}

/// Load the per-user configuration, layered over the system one.
///
/// On first use the user config file is created from the effective
/// defaults.
pub fn load_user_config() -> Result<Config> {
    let path = quay_model::config::user_config_path();
    if !path.is_file() {
        let cfg = load_system_config()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SchemaError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        save_config(&cfg, &path)?;
        return Ok(cfg);
    }
    load_layered_config(&path, load_system_config()?)
}

/// Apply the common keys from `path` (if it exists) over `base`.
fn load_layered_config(path: &Path, mut base: Config) -> Result<Config> {
    if !path.is_file() {
        return Ok(base);
    }
    let content = std::fs::read_to_string(path).map_err(|e| SchemaError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let root: Value = content.parse()?;
    load_common(&mut base, &root)?;
    Ok(base)
}

/// Persist the settable subset of a configuration (host and storage dir).
pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let mut doc = toml::Table::new();
    doc.insert("host".to_string(), Value::String(cfg.host.clone()));
    doc.insert(
        "storage_dir".to_string(),
        Value::String(cfg.storage_dir.display().to_string()),
    );
    std::fs::write(path, doc.to_string()).map_err(|e| SchemaError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
