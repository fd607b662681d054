//! Settings for a shelfnote sync.
//!
//! Settings are layered with [`figment`]: the TOML file at
//! [`default_path`] (or wherever `--config` points), then environment
//! variables prefixed with `SHELFNOTE_`. [`Settings::validate`] decides which
//! libraries a run will import and rejects unusable settings up front.

pub mod error;
mod legacy;
mod load;
mod settings;

pub use crate::load::{DEFAULT_CONFIG, ENV_PREFIX, FILE_NAME, default_path, init, write};
pub use crate::settings::{
    DEFAULT_TIMEOUT_SECS, LibraryKind, LibrarySettings, MissingSeriesNumber, Settings, SortBy, UnknownLibraryKind,
};
