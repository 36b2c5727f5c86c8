//! Deterministic text rendering of descriptors.
//!
//! Descriptors render to a stable line-oriented format: `key value`
//! directives, `section { ... }` blocks indented by four spaces, raw
//! insertion text passed through verbatim inside `raw { ... }` blocks.
//! Rendering the same descriptor twice yields byte-identical output.

use std::path::Path;

use quay_model::Visibility;

use crate::descriptor::{
    ChecksDescriptor, Guard, PackageDescriptor, SourceStrategy, TargetKind, WorkspaceDescriptor,
};
use crate::error::{EmitError, Result};

/// A descriptor that can render itself to text.
pub trait Render {
    fn render(&self) -> String;
}

/// Render a descriptor and write it to `path`, creating parent directories.
///
/// The file is only replaced when the content changed, so build systems
/// watching it do not re-run spuriously.
pub fn write_descriptor(path: &Path, doc: &impl Render) -> Result<()> {
    let text = doc.render();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| EmitError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let io_err = |source| EmitError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Ok(existing) = std::fs::read_to_string(path) {
        if existing == text {
            return Ok(());
        }
    }
    std::fs::write(path, text).map_err(io_err)?;
    tracing::debug!(path = %path.display(), "descriptor written");
    Ok(())
}

/// Line-oriented writer with block indentation.
struct Writer {
    out: String,
    depth: usize,
}

impl Writer {
    fn new() -> Self {
        Writer {
            out: String::new(),
            depth: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(&mut self, header: &str) {
        self.line(&format!("{header} {{"));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth -= 1;
        self.line("}");
    }

    /// Verbatim multi-line text, re-indented to the current depth.
    fn raw(&mut self, text: &str) {
        for line in text.lines() {
            if line.is_empty() {
                self.blank();
            } else {
                self.line(line);
            }
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

fn guard_header(guard: Guard, header: &str) -> String {
    match guard {
        Guard::Always => header.to_string(),
        Guard::StaticOnly => format!("{header} when static"),
        Guard::SharedOnly => format!("{header} when shared"),
    }
}

fn visibility_keyword(v: Visibility) -> &'static str {
    match v {
        Visibility::Public => "public",
        Visibility::Private => "private",
        Visibility::Interface => "interface",
    }
}

impl Render for PackageDescriptor {
    fn render(&self) -> String {
        let mut w = Writer::new();
        w.line(&format!("package {}", self.package));
        w.line(&format!("version {}", self.version));
        w.blank();

        let kind = match self.kind {
            TargetKind::Executable => "executable".to_string(),
            TargetKind::Interface => "interface".to_string(),
            TargetKind::Library(k) => format!("library {}", k.as_str()),
        };
        w.open(&format!("target {} {kind}", self.target_name));

        if let Some(sources) = &self.sources {
            match sources {
                SourceStrategy::GlobRecursive => w.line("sources glob-recursive"),
                SourceStrategy::Explicit(files) => {
                    w.open("sources");
                    for f in files {
                        w.line(f);
                    }
                    w.close();
                }
            }
        }
        for f in &self.exclude_from_build {
            w.line(&format!("exclude {f}"));
        }

        for (scope, dirs) in [
            ("public", &self.include_directories.public),
            ("private", &self.include_directories.private),
            ("interface", &self.include_directories.interface),
        ] {
            for d in dirs {
                w.line(&format!("include-dir {scope} {d}"));
            }
        }

        for edge in &self.link_edges {
            w.line(&format!(
                "link {} {}",
                visibility_keyword(edge.visibility),
                edge.target
            ));
        }

        for opt in &self.options {
            let has_directives = !opt.definitions.is_empty()
                || !opt.include_directories.is_empty()
                || !opt.link_directories.is_empty()
                || !opt.link_libraries.is_empty();
            if !has_directives {
                continue;
            }
            w.open(&guard_header(opt.guard, "options"));
            for (vis, def) in &opt.definitions {
                w.line(&format!("define {} {def}", visibility_keyword(*vis)));
            }
            let scope = visibility_keyword(opt.visibility);
            for d in &opt.include_directories {
                w.line(&format!("include-dir {scope} {d}"));
            }
            for d in &opt.link_directories {
                w.line(&format!("link-dir {scope} {d}"));
            }
            for l in &opt.link_libraries {
                w.line(&format!("link-library {scope} {l}"));
            }
            w.close();
        }

        for alias in &self.aliases {
            w.line(&format!("alias {alias}"));
        }

        if self.export {
            w.line("export");
        }
        w.close();

        for hook in &self.hooks {
            if hook.insertions.is_empty() {
                continue;
            }
            w.blank();
            w.open(&format!("hook {}", hook.hook.title().replace(' ', "-")));
            for ins in &hook.insertions {
                w.open(&guard_header(ins.guard, "raw"));
                w.raw(&ins.text);
                w.close();
            }
            w.close();
        }

        w.finish()
    }
}

impl Render for WorkspaceDescriptor {
    fn render(&self) -> String {
        let mut w = Writer::new();
        w.open("workspace");
        for sub in &self.direct {
            w.line(&format!("package {} {}", sub.short_id, sub.source_dir));
        }
        for sub in &self.indirect {
            w.line(&format!("peer {} {}", sub.short_id, sub.source_dir));
        }
        w.close();

        w.blank();
        w.open(&format!("target {} umbrella", self.umbrella_target));
        for link in &self.umbrella_links {
            w.line(&format!("link interface {link}"));
        }
        if self.export {
            w.line("export");
        }
        w.close();
        w.finish()
    }
}

impl Render for ChecksDescriptor {
    fn render(&self) -> String {
        let mut w = Writer::new();
        w.open(&format!("target {} helper", self.helper_target));
        for def in &self.global_definitions {
            w.line(&format!("define interface {def}"));
        }
        w.close();
        w.blank();

        for check in &self.checks {
            if check.headers.is_empty() {
                w.line(&format!(
                    "{} \"{}\" {}",
                    check.probe, check.input, check.variable
                ));
            } else {
                w.line(&format!(
                    "{} \"{}\" [{}] {}",
                    check.probe,
                    check.input,
                    check.headers.join(" "),
                    check.variable
                ));
            }
        }
        for binding in &self.size_bindings {
            w.line(&format!("bind-size {} {}", binding.source, binding.size_of));
            w.line(&format!("bind-size {} {}", binding.source, binding.sizeof));
        }
        w.line(&format!("test-big-endian {}", self.endianness_variable));
        for alias in &self.endianness_aliases {
            w.line(&format!(
                "bind-alias {} {alias}",
                self.endianness_variable
            ));
        }
        w.blank();

        for (variable, names) in &self.conditional_definitions {
            w.open(&format!("when {variable}"));
            for name in names {
                w.line(&format!("define interface {name}"));
            }
            w.close();
        }
        w.blank();
        w.line(&format!("rerun-on {}", self.rerun_on));
        w.finish()
    }
}
