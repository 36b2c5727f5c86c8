//! Build descriptor generation for quay.
//!
//! Lowered, backend-agnostic descriptions of what a build system must do
//! for each materialized package, plus the workspace meta-descriptor and
//! the aggregated platform-check helper. Descriptors are plain data; a
//! [`render::Render`] implementation turns them into text.
//!
//! # Architecture
//!
//! Generation runs per package against the package's own re-loaded
//! configuration and the resolved dependency fact, folding checks and
//! global definitions upward into the workspace aggregate. The workspace
//! and helper descriptors are emitted once, after every package.

pub mod checks;
pub mod descriptor;
pub mod error;
pub mod package;
pub mod render;
pub mod workspace;

// Re-exports for convenience.
pub use checks::generate_checks;
pub use descriptor::{
    ChecksDescriptor, Guard, LibraryKind, PackageDescriptor, SourceStrategy, TargetKind,
    WorkspaceDescriptor, HELPER_TARGET, UMBRELLA_TARGET,
};
pub use error::{EmitError, Result};
pub use package::{generate_package, KindPolicy};
pub use render::{write_descriptor, Render};
pub use workspace::generate_workspace;
