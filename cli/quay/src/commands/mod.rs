//! CLI command implementations.

pub mod init;
pub mod pack;
pub mod sync;
