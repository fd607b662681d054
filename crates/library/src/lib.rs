//! Turns Audiobookshelf library items into notes.
//!
//! The pieces, in the order an item flows through them:
//!
//! - [`record`] flattens an item (plus bookmarks and progress for audiobooks)
//!   into a [`RenderRecord`].
//! - [`path`] derives the vault path of its note from the metadata.
//! - [`template`] renders the user's template against the record.
//! - [`note`] creates the note or merges the new body into an existing one.
//!
//! [`import`] ties them together for whole libraries.

mod consts;
pub mod error;
pub mod import;
pub mod note;
pub mod path;
pub mod record;
pub mod template;

pub use crate::import::{ImportEvent, Importer, KindSummary, RunReport};
pub use crate::note::{Action, write_note};
pub use crate::record::RenderRecord;
pub use shelfnote_config::LibraryKind;
