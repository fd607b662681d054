//! What differs between importing audiobooks, ebooks and podcasts.
//!
//! Every kind runs the same steps (list items, maybe fetch related data,
//! expand, normalize, derive a path, render, write). A [`Pipeline`] holds the
//! per-kind answers to "which related data?", "where does the cover come
//! from?" and "what does one item expand into?".

use crate::import::error::{ErrorKind, Result};
use crate::note::{Action, write_note_inner};
use crate::path::{derive_path, episode_path};
use crate::record::{Cover, RenderRecord, Related, episode_record, normalize};
use crate::template::render;
use exn::ResultExt;
use shelfnote_config::{LibraryKind, LibrarySettings};
use shelfnote_remote::models::{Bookmark, Episode, LibraryItem, MediaProgress, Me};
use shelfnote_storage::{BackendHandle, validate_path};
use std::collections::HashMap;
use std::path::PathBuf;

/// What one listed item turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expansion {
    /// One note per item.
    Item,
    /// One note per episode, fetched separately for every podcast.
    Episodes,
}

pub(crate) struct Pipeline<'a> {
    pub kind: LibraryKind,
    pub library: &'a LibrarySettings,
    /// Join bookmarks and progress from `/api/me` onto every item.
    pub related: bool,
    pub expansion: Expansion,
    base_url: &'a str,
}

impl<'a> Pipeline<'a> {
    pub fn new(kind: LibraryKind, library: &'a LibrarySettings, base_url: &'a str) -> Self {
        let (related, expansion) = match kind {
            LibraryKind::Audiobooks => (true, Expansion::Item),
            LibraryKind::Ebooks => (false, Expansion::Item),
            LibraryKind::Podcasts => (false, Expansion::Episodes),
        };
        Self {
            kind,
            library,
            related,
            expansion,
            base_url,
        }
    }

    fn cover(&self) -> Cover<'a> {
        match self.expansion {
            Expansion::Item => Cover::Server(self.base_url),
            Expansion::Episodes => Cover::Metadata,
        }
    }

    /// Record and note path for a book.
    pub fn plan_item(&self, item: &LibraryItem, related: Option<&RelatedData>) -> Result<(RenderRecord, PathBuf)> {
        let related = related.map(|data| data.for_item(&item.id));
        let record = normalize(item, related, self.cover());
        let path = derive_path(
            &self.library.dir,
            &item.media.metadata,
            self.library.sort_by,
            self.library.missing_series_number,
        )
        .or_raise(|| ErrorKind::Path(item.id.clone()))?;
        Ok((record, path))
    }

    /// Record of a podcast, the base for all its episodes.
    pub fn plan_podcast(&self, podcast: &LibraryItem) -> RenderRecord {
        normalize(podcast, None, self.cover())
    }

    /// Record and note path for one episode of `podcast_title`.
    pub fn plan_episode(
        &self,
        podcast: &RenderRecord,
        podcast_title: &str,
        episode: &Episode,
    ) -> Result<(RenderRecord, PathBuf)> {
        let label = || ErrorKind::Path(format!("{podcast_title}: {}", episode.title().unwrap_or_default()));
        let Some(title) = episode.title() else {
            exn::bail!(label());
        };
        let path = episode_path(&self.library.dir, podcast_title, &title).or_raise(label)?;
        Ok((episode_record(podcast, episode), path))
    }

    /// Render the template for `record` and write it to `path`.
    pub async fn write(&self, backend: &BackendHandle, record: &RenderRecord, path: PathBuf) -> Result<Action> {
        let body = render(&self.library.template, record);
        write_note_inner(backend, &path, record, &body).await.or_raise(|| ErrorKind::Note(path.clone()))
    }

    /// Create the library's base folder if it doesn't exist yet.
    pub async fn ensure_base_dir(&self, backend: &BackendHandle) -> Result<()> {
        let dir = self.library.dir.trim();
        if dir.is_empty() {
            return Ok(());
        }
        let folder = || ErrorKind::Folder(PathBuf::from(dir));
        let path = validate_path(dir).or_raise(folder)?;
        if !backend.exists(&path).await.or_raise(folder)? {
            backend.create_dir(&path).await.or_raise(folder)?;
            tracing::debug!(kind = %self.kind, folder = %path.display(), "Created folder");
        }
        Ok(())
    }
}

/// Bookmarks and progress from `/api/me`, indexed by library item id.
#[derive(Debug, Default)]
pub(crate) struct RelatedData {
    bookmarks: HashMap<String, Vec<Bookmark>>,
    progress: HashMap<String, MediaProgress>,
}

impl RelatedData {
    pub fn for_item(&self, id: &str) -> Related<'_> {
        Related {
            bookmarks: self.bookmarks.get(id).map(Vec::as_slice).unwrap_or_default(),
            progress: self.progress.get(id),
        }
    }
}

impl From<Me> for RelatedData {
    fn from(me: Me) -> Self {
        let mut bookmarks: HashMap<String, Vec<Bookmark>> = HashMap::new();
        for bookmark in me.bookmarks {
            bookmarks.entry(bookmark.library_item_id.clone()).or_default().push(bookmark);
        }
        // Later records for the same item win.
        let progress = me.media_progress.into_iter().map(|progress| (progress.library_item_id.clone(), progress)).collect();
        Self { bookmarks, progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::ops::Deref;
    use std::path::Path;

    fn library(dir: &str) -> LibrarySettings {
        LibrarySettings {
            enable: true,
            dir: dir.into(),
            lib: "lib".into(),
            template: "# {{title}}".into(),
            ..LibrarySettings::default()
        }
    }

    #[test]
    fn test_related_data_groups_in_order() {
        let me: Me = serde_json::from_value(json!({
            "bookmarks": [
                { "libraryItemId": "a", "title": "first", "time": 1 },
                { "libraryItemId": "b", "title": "other", "time": 2 },
                { "libraryItemId": "a", "title": "second", "time": 3 },
            ],
            "mediaProgress": [
                { "libraryItemId": "a", "progress": 0.1 },
                { "libraryItemId": "a", "progress": 0.9, "isFinished": true },
            ],
        }))
        .unwrap();
        let data = RelatedData::from(me);
        let related = data.for_item("a");
        let titles: Vec<_> = related.bookmarks.iter().filter_map(|b| b.title.as_deref()).collect();
        assert_eq!(titles, ["first", "second"]);
        assert_eq!(related.progress.and_then(MediaProgress::fraction), Some(0.9));
        let missing = data.for_item("zzz");
        assert!(missing.bookmarks.is_empty());
        assert!(missing.progress.is_none());
    }

    #[test]
    fn test_pipeline_shapes() {
        let settings = library("ABS");
        let audiobooks = Pipeline::new(LibraryKind::Audiobooks, &settings, "https://abs");
        assert!(audiobooks.related);
        assert_eq!(audiobooks.expansion, Expansion::Item);
        let ebooks = Pipeline::new(LibraryKind::Ebooks, &settings, "https://abs");
        assert!(!ebooks.related);
        let podcasts = Pipeline::new(LibraryKind::Podcasts, &settings, "https://abs");
        assert_eq!(podcasts.expansion, Expansion::Episodes);
    }

    #[test]
    fn test_plan_item_without_title() {
        let settings = library("ABS");
        let pipeline = Pipeline::new(LibraryKind::Ebooks, &settings, "https://abs");
        let item: LibraryItem = serde_json::from_value(json!({ "id": "li_x", "media": { "metadata": {} } })).unwrap();
        let err = pipeline.plan_item(&item, None).unwrap_err();
        assert_eq!(err.deref(), &ErrorKind::Path("li_x".into()));
    }

    #[test]
    fn test_plan_episode() {
        let settings = library("ABS/Podcasts");
        let pipeline = Pipeline::new(LibraryKind::Podcasts, &settings, "https://abs");
        let episode: Episode = serde_json::from_value(json!({ "title": "Ep. 1: Hello?" })).unwrap();
        let (record, path) = pipeline.plan_episode(&RenderRecord::default(), "Show", &episode).unwrap();
        assert_eq!(path, Path::new("ABS/Podcasts/Show/Ep. 1 Hello.md"));
        assert_eq!(record.get("title"), Some(&json!("Ep. 1: Hello?")));
    }

    #[test]
    fn test_plan_episode_without_title() {
        let settings = library("ABS/Podcasts");
        let pipeline = Pipeline::new(LibraryKind::Podcasts, &settings, "https://abs");
        let err = pipeline.plan_episode(&RenderRecord::default(), "Show", &Episode::default()).unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Path(label) if label.starts_with("Show")));
    }
}
