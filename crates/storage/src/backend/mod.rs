//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the file store that notes
//! are created in and merged into. The local filesystem backend is what a real
//! vault uses; the read-only decorator turns any backend into a dry run.

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;

pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for the notes vault.
///
/// The operations mirror what a note-taking host exposes to plugins: check
/// whether something exists, read a note, create or overwrite a note, and
/// create folders. It's a glorified CRUD interface, minus the D.
///
/// # Path Handling
/// All paths are relative to the vault root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use shelfnote_storage::{backend::StorageBackend, error::Result};
///
/// async fn read_or_empty(backend: &dyn StorageBackend, path: &Path) -> Result<String> {
///     if backend.exists(path).await? {
///         let data = backend.read(path).await?;
///         Ok(String::from_utf8_lossy(&data).into_owned())
///     } else {
///         Ok(String::new())
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// Check if a file or folder exists at `path`.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use shelfnote_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// if backend.exists(Path::new("ABS/Audiobooks/Herbert, Frank/Dune.md")).await? {
    ///     println!("Note exists!");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents.
    ///
    /// Creates a new file or replaces an existing file with the provided data
    /// in a single operation.
    ///
    /// # Notes
    /// - Implementations should create parent folders as needed, but callers
    ///   that care about logging folder creation call
    ///   [`create_dir`](Self::create_dir) first.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Create a folder and any missing ancestors.
    ///
    /// Succeeds without doing anything if the folder already exists. Returns
    /// [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) if a file
    /// occupies the path.
    async fn create_dir(&self, path: &Path) -> Result<()>;
}
