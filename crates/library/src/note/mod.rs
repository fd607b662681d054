//! Creating notes and merging fresh metadata into existing ones.
//!
//! A note has up to three parts:
//!
//! ```text
//! ---
//! title: {{title}}          <- frontmatter, optional
//! ---
//! %%Metadata - When Syncing everything between these comments will be rewritten%%
//! ...                       <- machine-owned section, rewritten on every sync
//! %%
//!
//! # Your notes here         <- everything else belongs to the user
//! ```
//!
//! A new note gets the section and a heading. An existing note keeps every
//! byte outside the section, except for `{{key}}` tokens in frontmatter
//! values that the record can now fill. Both edits land in one write, and a
//! note that wouldn't change isn't written at all.
//!
//! The primary entry point is [`write_note`].

pub mod error;
mod file;
mod merge;

pub use self::file::{Action, write_note};
pub(crate) use self::file::write_note_inner;
pub use self::merge::{compose, merge};

/// Opens the machine-owned section.
pub const METADATA_START: &str = "%%Metadata - When Syncing everything between these comments will be rewritten%%";
/// Closes the machine-owned section: the first occurrence after the start.
pub const METADATA_END: &str = "%%";
/// Placed below the section of a freshly created note.
pub const USER_HEADING: &str = "# Your notes here";
