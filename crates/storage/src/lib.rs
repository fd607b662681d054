//! File store abstraction for the notes vault.
//!
//! Every note `shelfnote` writes goes through a [`StorageBackend`]. Paths are
//! always relative to the vault root and validated with [`validate_path`]
//! before touching anything.

pub mod backend;
pub mod error;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
