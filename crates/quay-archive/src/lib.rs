//! Source discovery and package archives for quay.
//!
//! Turns a project's declared source set into a concrete validated file
//! list, then packs those files into the deterministic gzip tarball the
//! registry serves. The reverse direction, unpacking fetched archives
//! into the cache, lives here too.

pub mod discover;
pub mod error;
pub mod filetype;
pub mod pack;

// Re-exports for convenience.
pub use discover::find_sources;
pub use error::{ArchiveError, Result};
pub use filetype::{check_file_types, is_compiled_source};
pub use pack::{pack, unpack};
