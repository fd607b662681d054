//! Error types for the [`note`](super) module.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A note error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for note operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A storage backend operation (exists, read, write, create folder) failed.
    #[display("storage operation failed for {}", _0.display())]
    Storage(#[error(not(source))] PathBuf),
    /// The existing note isn't UTF-8 text.
    #[display("note is not valid UTF-8: {}", _0.display())]
    Encoding(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
