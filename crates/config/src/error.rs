//! Configuration Error Types

use crate::LibraryKind;
use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why the settings can't be used.
///
/// The validation variants are reported before any request is made, so a
/// misconfigured run never touches the network or the vault.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The layered settings could not be extracted (bad TOML, wrong types).
    #[display("could not load settings")]
    Load,
    #[display("no Audiobookshelf host configured")]
    MissingHost,
    #[display("no API key configured")]
    MissingApiKey,
    #[display("no library is enabled")]
    NoLibraryEnabled,
    #[display("{_0} library is enabled but has no library id")]
    MissingLibraryId(#[error(not(source))] LibraryKind),
    #[display("could not read the {_0} template file")]
    Template(#[error(not(source))] LibraryKind),
    /// Reading or writing a settings file failed.
    #[display("I/O error on {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// Settings could not be rendered back to TOML.
    #[display("could not serialize settings")]
    Serialize,
    /// The platform has no notion of a per-user config directory.
    #[display("could not determine the user config directory")]
    NoConfigDir,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
