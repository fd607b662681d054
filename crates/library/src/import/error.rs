//! Error types for the [`import`](super) module.
//!
//! Uses [`exn`] for automatic location tracking and error tree construction.
//! Errors raised from the remote client keep the request URL in their
//! frames, so logging an error with `{:?}` shows which endpoint failed.

use derive_more::{Display, Error};
use shelfnote_config::LibraryKind;
use std::path::PathBuf;

/// An import error with automatic location tracking via [`exn::Exn`].
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an import failure, from the widest scope to the
/// narrowest.
///
/// ### Fatal to the run
/// - [`ErrorKind::Configuration`]: raised before any request is made.
///
/// ### Fatal to one library kind
/// - [`ErrorKind::Configuration`]: the kind's own settings, e.g. no library id
/// - [`ErrorKind::Fetch`]
/// - [`ErrorKind::Folder`]
///
/// ### Fatal to one podcast or note
/// - [`ErrorKind::EpisodeFetch`]
/// - [`ErrorKind::Path`]
/// - [`ErrorKind::Note`]
///
/// ### Never fatal
/// - [`ErrorKind::OptionalFetch`]: logged, the audiobooks import carries on
///   without bookmarks and progress.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Settings are unusable.
    #[display("invalid configuration")]
    Configuration,
    /// The item listing of a library could not be fetched or decoded.
    #[display("could not fetch {_0}")]
    Fetch(#[error(not(source))] LibraryKind),
    /// `/api/me` (bookmarks and progress) could not be fetched or decoded.
    #[display("could not fetch bookmarks and listening progress")]
    OptionalFetch,
    /// The episodes of one podcast could not be fetched or decoded.
    #[display("could not fetch episodes of {_0:?}")]
    EpisodeFetch(#[error(not(source))] String),
    /// The base folder of a library could not be created.
    #[display("could not create folder {}", _0.display())]
    Folder(#[error(not(source))] PathBuf),
    /// No usable note path could be derived for an item.
    #[display("could not derive a note path for {_0:?}")]
    Path(#[error(not(source))] String),
    /// A note could not be created or updated.
    #[display("could not write note {}", _0.display())]
    Note(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Fetch(_) | Self::OptionalFetch | Self::EpisodeFetch(_) | Self::Folder(_) | Self::Note(_)
        )
    }
}
