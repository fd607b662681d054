//! Library Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Each module with its own failure modes ([`import`],
//! [`note`]) has a more specific `ErrorKind`; the public entry points raise
//! those into one of the kinds below.
//!
//! [`import`]: crate::import
//! [`note`]: crate::note

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The item has no title to name its note after.
    #[display("item has no title")]
    MissingTitle,
    /// The derived path would leave the vault or is otherwise unusable.
    #[display("issue with path generation from metadata")]
    Path,
    #[display("import failed")]
    Import,
    #[display("note could not be written")]
    Note,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Import | Self::Note)
    }
}
