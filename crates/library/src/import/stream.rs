use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::import::Importer;
use crate::import::error::{Error as ImportError, ErrorKind as ImportErrorKind, Result as ImportResult};
use crate::import::pipeline::{Expansion, Pipeline, RelatedData};
use crate::note::Action;
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use shelfnote_config::LibraryKind;

/// Progress events emitted by [`Importer::import`].
///
/// For every library kind that runs, events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`Discovered`](Self::Discovered): once the item listing arrived.
/// 3. [`Written`](Self::Written): zero or more times, one per note.
/// 4. [`Complete`](Self::Complete) or [`Failed`](Self::Failed): exactly once.
///
/// Errors scoped to a single note or podcast are yielded as `Err` items
/// between the `Written` events and don't end the kind. A configuration error
/// is the only `Err` that ends the whole stream.
#[derive(Debug)]
pub enum ImportEvent {
    Started(LibraryKind),
    /// The library listing returned this many items.
    Discovered(LibraryKind, usize),
    Written(Action),
    /// The kind was abandoned; later kinds still run.
    Failed(LibraryKind, ImportError),
    Complete(LibraryKind, KindSummary),
}

/// Tally of one library kind's import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Notes (or whole podcasts) that could not be imported.
    pub failed: usize,
}

impl KindSummary {
    pub(crate) fn record(&mut self, action: &Action) {
        match action {
            Action::Created(_) => self.created += 1,
            Action::Updated(_) => self.updated += 1,
            Action::Unchanged(_) => self.unchanged += 1,
        }
    }

    /// Notes that were written to.
    pub fn written(&self) -> usize {
        self.created + self.updated
    }
}

impl Importer {
    /// Streams [`ImportEvent`]s for every enabled library kind (or just
    /// `only`), in the order audiobooks, ebooks, podcasts.
    ///
    /// Settings are validated before anything else; when they are unusable
    /// the stream yields a single error and no request is made. A kind whose
    /// own settings are incomplete fails alone, also without a request.
    pub fn import(&self, only: Option<LibraryKind>) -> impl Stream<Item = LibraryResult<ImportEvent>> + '_ {
        // `rustfmt` does not format macro-specific syntax such as
        // `for await` even using the parentheses trick.
        stream! {
            for await event in self.import_inner(only) {
                yield event.or_raise(|| LibraryErrorKind::Import);
            }
        }
    }

    pub(crate) fn import_inner(&self, only: Option<LibraryKind>) -> impl Stream<Item = ImportResult<ImportEvent>> + '_ {
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            let kinds = match self.settings.validate(only).or_raise(|| ImportErrorKind::Configuration) {
                Ok(kinds) => kinds,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            for kind in kinds {
                for await event in self.import_kind(kind) {
                    yield event;
                }
            }
        })
    }

    fn import_kind(&self, kind: LibraryKind) -> impl Stream<Item = ImportResult<ImportEvent>> + '_ {
        stream!({
            let pipeline = Pipeline::new(kind, self.settings.library(kind), self.client.base_url());
            let mut summary = KindSummary::default();
            yield Ok(ImportEvent::Started(kind));

            if let Err(e) = pipeline.library.validate(kind).or_raise(|| ImportErrorKind::Configuration) {
                yield Ok(ImportEvent::Failed(kind, e));
                return;
            }

            let items = match self.client.library_items(&pipeline.library.lib).await.or_raise(|| ImportErrorKind::Fetch(kind)) {
                Ok(items) => items,
                Err(e) => {
                    yield Ok(ImportEvent::Failed(kind, e));
                    return;
                },
            };
            yield Ok(ImportEvent::Discovered(kind, items.len()));

            let related = if pipeline.related { Some(self.related_data().await) } else { None };

            if let Err(e) = pipeline.ensure_base_dir(&self.backend).await {
                yield Ok(ImportEvent::Failed(kind, e));
                return;
            }

            for item in &items {
                match pipeline.expansion {
                    Expansion::Item => {
                        let result = match pipeline.plan_item(item, related.as_ref()) {
                            Ok((record, path)) => pipeline.write(&self.backend, &record, path).await,
                            Err(e) => Err(e),
                        };
                        match result {
                            Ok(action) => {
                                summary.record(&action);
                                yield Ok(ImportEvent::Written(action));
                            },
                            Err(e) => {
                                summary.failed += 1;
                                yield Err(e);
                            },
                        }
                    },
                    Expansion::Episodes => {
                        let podcast = pipeline.plan_podcast(item);
                        let Some(title) = item.media.metadata.title() else {
                            summary.failed += 1;
                            yield Err(exn::Exn::from(ImportErrorKind::Path(item.id.clone())));
                            continue;
                        };
                        let detail = match self.client.item(&item.id).await.or_raise(|| ImportErrorKind::EpisodeFetch(title.clone())) {
                            Ok(detail) => detail,
                            Err(e) => {
                                summary.failed += 1;
                                yield Err(e);
                                continue;
                            },
                        };
                        tracing::debug!(podcast = %title, episodes = detail.media.episodes.len(), "Fetched episodes");
                        for episode in &detail.media.episodes {
                            let result = match pipeline.plan_episode(&podcast, &title, episode) {
                                Ok((record, path)) => pipeline.write(&self.backend, &record, path).await,
                                Err(e) => Err(e),
                            };
                            match result {
                                Ok(action) => {
                                    summary.record(&action);
                                    yield Ok(ImportEvent::Written(action));
                                },
                                Err(e) => {
                                    summary.failed += 1;
                                    yield Err(e);
                                },
                            }
                        }
                    },
                }
            }

            yield Ok(ImportEvent::Complete(kind, summary));
        })
    }

    /// Bookmarks and progress, or nothing at all when `/api/me` fails.
    async fn related_data(&self) -> RelatedData {
        match self.client.me().await.or_raise(|| ImportErrorKind::OptionalFetch) {
            Ok(me) => RelatedData::from(me),
            Err(err) => {
                tracing::warn!(error = ?err, "Continuing without bookmarks and progress");
                RelatedData::default()
            },
        }
    }
}
