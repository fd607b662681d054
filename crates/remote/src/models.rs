//! Response models for the Audiobookshelf API.
//!
//! The server's metadata objects differ between audiobooks, ebooks and
//! podcasts and grow new fields over time, so [`Metadata`] and [`Episode`]
//! keep the raw JSON object and expose typed accessors on top of it.
//! Everything that isn't needed for paths is passed through untouched.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `GET /api/libraries/{id}/items`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemList {
    #[serde(default)]
    pub results: Vec<LibraryItem>,
}

/// A single audiobook, ebook or podcast.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LibraryItem {
    pub id: String,
    #[serde(rename = "relPath", default)]
    pub rel_path: Option<String>,
    #[serde(default)]
    pub media: Media,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub metadata: Metadata,
    /// Only populated for podcasts fetched via `GET /api/items/{id}`.
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

/// Loosely-typed item metadata.
///
/// `null` and a missing key are treated the same by every accessor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub Map<String, Value>);

impl Metadata {
    /// Raw value for `key`, `None` when missing or `null`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Value for `key` as text. Numbers and booleans are rendered in their
    /// JSON form; lists and objects are not text and yield `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<String> {
        self.text("title")
    }

    pub fn author_name(&self) -> Option<String> {
        self.text("authorName")
    }

    /// Author name in "Last, First" form.
    pub fn author_name_lf(&self) -> Option<String> {
        self.text("authorNameLF")
    }

    /// Podcasts carry a plain `author` instead of `authorName`.
    pub fn author(&self) -> Option<String> {
        self.text("author")
    }

    /// e.g. `"Dune #1"` or `"Dune #1, Dune Chronicles #1"`.
    pub fn series_name(&self) -> Option<String> {
        self.text("seriesName")
    }

    /// Podcast cover, already a complete URL.
    pub fn image_url(&self) -> Option<String> {
        self.text("imageUrl")
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// `GET /api/me`, reduced to the parts we use.
///
/// Bookmarks and progress are extras, so an entry that doesn't decode is
/// skipped on its own instead of failing the whole response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Me {
    #[serde(default, deserialize_with = "lenient_list")]
    pub bookmarks: Vec<Bookmark>,
    #[serde(rename = "mediaProgress", default, deserialize_with = "lenient_list")]
    pub media_progress: Vec<MediaProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    /// Position in seconds, `0` when the server sent something else.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub time: f64,
    #[serde(
        rename = "createdAt",
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<i64>,
    #[serde(rename = "libraryItemId", skip_serializing)]
    pub library_item_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaProgress {
    #[serde(rename = "libraryItemId")]
    pub library_item_id: String,
    #[serde(rename = "isFinished", default, deserialize_with = "lenient_flag")]
    pub is_finished: bool,
    /// Fraction in `0..=1`. Kept as raw JSON because the server has been seen
    /// sending `null` here.
    #[serde(default)]
    pub progress: Option<Value>,
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping malformed entry");
                None
            },
        })
        .collect())
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_f64().filter(|f| f.is_finite()).unwrap_or_default())
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_i64())
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_bool().unwrap_or_default())
}

impl MediaProgress {
    /// Progress as a finite number, if the server sent one.
    pub fn fraction(&self) -> Option<f64> {
        self.progress.as_ref().and_then(Value::as_f64).filter(|f| f.is_finite())
    }
}

/// A podcast episode, kept as the raw JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Episode(pub Map<String, Value>);

impl Episode {
    fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<String> {
        self.text("title")
    }

    pub fn description(&self) -> Option<String> {
        self.text("description")
    }

    pub fn pub_date(&self) -> Option<String> {
        self.text("pubDate")
    }

    pub fn audio_file(&self) -> Option<&Value> {
        self.0.get("audioFile").filter(|v| !v.is_null())
    }

    /// `audioFile.metaTags.tagGenre`, which the importer files under
    /// `publishedYear`.
    pub fn tag_genre(&self) -> Option<String> {
        match self.audio_file()?.get("metaTags")?.get("tagGenre")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
