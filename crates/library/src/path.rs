//! Where notes live in the vault.
//!
//! Books are filed by author, then by series when they belong to one:
//!
//! ```text
//! {dir}/{author}/{title}.md
//! {dir}/{author}/{series}/{number} | {title}.md
//! ```
//!
//! Podcast episodes are filed by podcast: `{dir}/{podcast}/{episode}.md`.
//!
//! Every path is passed through [`validate_path`] before it is returned, so
//! metadata can't be used to climb out of the vault.

use crate::consts::{SERIES_NUMBER_REGEX, SERIES_SEPARATOR_REGEX};
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use shelfnote_remote::models::Metadata;
use shelfnote_storage::validate_path;
use std::path::PathBuf;

pub use shelfnote_config::{MissingSeriesNumber, SortBy};

/// Rendered in place of a missing series number by [`MissingSeriesNumber::Literal`].
const MISSING_NUMBER: &str = "null";
const FORBIDDEN: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Strip characters that can't appear in a file name on common platforms.
///
/// Nothing is replaced and whitespace is left alone.
///
/// ```
/// # use shelfnote_library::path::sanitize;
/// assert_eq!(sanitize("Who? Me: A Story"), "Who Me A Story");
/// ```
pub fn sanitize(title: &str) -> String {
    title.chars().filter(|c| !FORBIDDEN.contains(c)).collect()
}

/// Author folder name for `metadata`. Missing authors yield an empty string.
pub fn sort_artist(metadata: &Metadata, sort_by: SortBy) -> String {
    metadata.text(sort_by.field()).unwrap_or_default()
}

/// A series membership parsed from a `seriesName` such as `"Dune #1"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub title: String,
    /// Position within the series, as written (`"1"`, `"2.5"`).
    pub number: Option<String>,
}

/// Parse the first series membership out of a `seriesName`.
///
/// The server joins several memberships with commas
/// (`"Dune #1, Dune Chronicles #1"`); only the first one counts.
///
/// ```
/// # use shelfnote_library::path::{Series, parse_series};
/// assert_eq!(
///     parse_series("Dune #1, Dune Chronicles #1"),
///     Some(Series { title: "Dune".into(), number: Some("1".into()) }),
/// );
/// assert_eq!(parse_series(""), None);
/// ```
pub fn parse_series(series_name: &str) -> Option<Series> {
    if series_name.trim().is_empty() {
        return None;
    }
    // Keep the number, drop the comma and everything after it.
    let first = match SERIES_SEPARATOR_REGEX.find(series_name) {
        Some(separator) => &series_name[..separator.end() - 1],
        None => series_name,
    };
    let (title, number) = match SERIES_NUMBER_REGEX.captures(first) {
        Some(caps) => (&first[..caps.get(0).map_or(first.len(), |m| m.start())], caps.get(1).map(|m| m.as_str())),
        None => (first, None),
    };
    Some(Series {
        title: title.trim().to_string(),
        number: number.map(String::from),
    })
}

fn finish(segments: &[&str]) -> Result<PathBuf> {
    let joined = segments.join("/");
    validate_path(&joined).or_raise(|| ErrorKind::Path)
}

/// Vault path of the note for a book.
///
/// ```
/// # use shelfnote_library::path::{MissingSeriesNumber, SortBy, derive_path};
/// # use shelfnote_remote::models::Metadata;
/// # use std::path::Path;
/// let metadata: Metadata = [
///     ("title", "Dune Messiah"),
///     ("authorNameLF", "Herbert, Frank"),
///     ("seriesName", "Dune #2"),
/// ]
/// .into_iter()
/// .collect();
/// let path = derive_path("ABS/Audiobooks", &metadata, SortBy::AuthorNameLF, MissingSeriesNumber::Literal).unwrap();
/// assert_eq!(path, Path::new("ABS/Audiobooks/Herbert, Frank/Dune/2 | Dune Messiah.md"));
/// ```
///
/// # Errors
/// [`MissingTitle`](ErrorKind::MissingTitle) when the metadata has no title,
/// [`Path`](ErrorKind::Path) when the result isn't a valid vault path.
pub fn derive_path(
    base_dir: &str,
    metadata: &Metadata,
    sort_by: SortBy,
    missing_number: MissingSeriesNumber,
) -> Result<PathBuf> {
    let title = sanitize(&metadata.title().ok_or_raise(|| ErrorKind::MissingTitle)?);
    let artist = sort_artist(metadata, sort_by);
    let Some(series) = metadata.series_name().as_deref().and_then(parse_series) else {
        return finish(&[base_dir, &artist, &format!("{title}.md")]);
    };
    let file = match (series.number.as_deref(), missing_number) {
        (Some(number), _) => format!("{number} | {title}.md"),
        (None, MissingSeriesNumber::Literal) => format!("{MISSING_NUMBER} | {title}.md"),
        (None, MissingSeriesNumber::Omit) => format!("{title}.md"),
    };
    finish(&[base_dir, &artist, &series.title, &file])
}

/// Vault path of the note for a podcast episode.
pub fn episode_path(base_dir: &str, podcast_title: &str, episode_title: &str) -> Result<PathBuf> {
    finish(&[base_dir, &sanitize(podcast_title), &format!("{}.md", sanitize(episode_title))])
}
