//! Flattening of library items into the key/value record templates see.
//!
//! A [`RenderRecord`] is the union of the item's metadata fields and a few
//! derived ones:
//!
//! | Key          | Value                                                        |
//! |--------------|--------------------------------------------------------------|
//! | `coverURL`   | Server cover URL, or `imageUrl` for podcasts                 |
//! | `jsonData`   | Pretty-printed JSON dump of the item                         |
//! | `metadata`   | The raw metadata object                                      |
//! | `bookmarks`  | Audiobooks only: the item's bookmarks, in server order       |
//! | `isStarted`  | Audiobooks only: a progress record exists                    |
//! | `isFinished` | Audiobooks only: the progress record is flagged finished     |
//! | `Progress`   | Audiobooks only: integer percentage, `0` when unknown        |
//!
//! Fields the server didn't send (or sent as `null`) are simply not in the
//! record.

use serde::Serialize;
use serde_json::{Map, Value};
use shelfnote_remote::models::{Bookmark, Episode, LibraryItem, MediaProgress, Metadata};
use std::collections::BTreeMap;

/// Flat `key → value` map fed to the [template](crate::template) renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderRecord(BTreeMap<String, Value>);

impl RenderRecord {
    /// Value for `key`; `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert `value`, or drop `key` entirely when there is none.
    pub fn set(&mut self, key: impl Into<String>, value: Option<impl Into<Value>>) {
        let key = key.into();
        match value {
            Some(value) => {
                self.0.insert(key, value.into());
            },
            None => {
                self.0.remove(&key);
            },
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for RenderRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Where an item's `coverURL` comes from.
#[derive(Debug, Clone, Copy)]
pub enum Cover<'a> {
    /// Synthesized from the server's base URL and the item id.
    Server(&'a str),
    /// `metadata.imageUrl`, verbatim.
    Metadata,
}

/// Bookmarks and listening progress joined onto an audiobook.
#[derive(Debug, Clone, Copy, Default)]
pub struct Related<'a> {
    pub bookmarks: &'a [Bookmark],
    pub progress: Option<&'a MediaProgress>,
}

#[derive(Serialize)]
struct ItemDump<'a> {
    id: &'a str,
    #[serde(rename = "relPath", skip_serializing_if = "Option::is_none")]
    rel_path: Option<&'a str>,
    metadata: &'a Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    bookmarks: Option<&'a [Bookmark]>,
}

/// `{base}/audiobookshelf/api/items/{id}/cover`
pub fn cover_url(base_url: &str, id: &str) -> String {
    format!("{base_url}/audiobookshelf/api/items/{id}/cover")
}

/// Listening progress as a whole percentage.
///
/// ```
/// # use shelfnote_library::record::progress_percent;
/// assert_eq!(progress_percent(Some(0.666)), 67);
/// assert_eq!(progress_percent(Some(f64::NAN)), 0);
/// assert_eq!(progress_percent(None), 0);
/// ```
pub fn progress_percent(fraction: Option<f64>) -> i64 {
    match fraction {
        // `as` saturates, so absurd values can't wrap.
        Some(fraction) if fraction.is_finite() => (fraction * 100.0).round() as i64,
        _ => 0,
    }
}

fn pretty<T: Serialize>(value: &T) -> String {
    // Maps and plain structs of strings always serialize.
    serde_json::to_string_pretty(value).unwrap_or_default()
}

/// Build the record for one audiobook, ebook or podcast.
///
/// `related` is only given for audiobooks; its presence decides whether the
/// bookmark and progress keys exist at all.
pub fn normalize(item: &LibraryItem, related: Option<Related<'_>>, cover: Cover<'_>) -> RenderRecord {
    let metadata = &item.media.metadata;
    let mut record: RenderRecord =
        metadata.0.iter().filter(|(_, value)| !value.is_null()).map(|(k, v)| (k.clone(), v.clone())).collect();

    record.insert("metadata", Value::Object(metadata.0.clone()));
    record.set(
        "coverURL",
        match cover {
            Cover::Server(base_url) => Some(cover_url(base_url, &item.id)),
            Cover::Metadata => metadata.image_url(),
        },
    );
    record.insert(
        "jsonData",
        pretty(&ItemDump {
            id: &item.id,
            rel_path: item.rel_path.as_deref(),
            metadata,
            bookmarks: related.map(|related| related.bookmarks),
        }),
    );

    if let Some(Related { bookmarks, progress }) = related {
        let bookmarks: Vec<Value> =
            bookmarks.iter().map(|bookmark| serde_json::to_value(bookmark).unwrap_or_default()).collect();
        record.insert("bookmarks", bookmarks);
        record.insert("isStarted", progress.is_some());
        record.insert("isFinished", progress.is_some_and(|progress| progress.is_finished));
        record.insert("Progress", progress_percent(progress.and_then(MediaProgress::fraction)));
    }
    record
}

/// Build the record for one podcast episode from its podcast's record.
///
/// The episode's own title, description and publication date replace the
/// podcast's. `publishedYear` is taken from the audio file's genre tag and
/// `metadata` becomes the audio file object, mirroring how the podcast
/// importer has always filled them.
pub fn episode_record(podcast: &RenderRecord, episode: &Episode) -> RenderRecord {
    let mut record = podcast.clone();
    record.set("title", episode.title());
    record.set("description", episode.description());
    record.set("publishedDate", episode.pub_date());
    record.set("publishedYear", episode.tag_genre());
    record.set("metadata", episode.audio_file().cloned());
    record.insert("jsonData", pretty(&Value::Object(Map::clone(&episode.0))));
    record
}
