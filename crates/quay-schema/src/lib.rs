//! Structured config mapper for the quay package manager.
//!
//! Converts a generic scalar/sequence/map document tree (`toml::Value`)
//! into the typed model from `quay-model`. The mapper handles the
//! "variety" polymorphism (a field may legally appear as a scalar, a
//! list, or a map with sub-keys) and reports every malformed shape as a
//! schema error naming the offending key.
//!
//! Node mapping performs no filesystem or network access; the file-level
//! helpers in [`load`] are the only functions that read from disk.

pub mod error;
pub mod load;
pub mod value;

// Re-exports for convenience.
pub use error::{Result, SchemaError};
pub use load::{
    load_config_node, load_config_str, load_file, load_project, load_system_config,
    load_user_config,
};
pub use value::Variety;
