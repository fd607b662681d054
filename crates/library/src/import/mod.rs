//! Importing whole libraries.
//!
//! An [`Importer`] runs every enabled library kind (audiobooks, ebooks,
//! podcasts) one after the other. Each kind lists its items, optionally
//! joins related data, derives a path and renders a note per item (or per
//! episode for podcasts), then hands the note to [`write_note`].
//!
//! Failures are contained at the smallest useful scope: a failed listing
//! abandons only its own kind, a failed episode fetch skips only that
//! podcast, and a failed note skips only that note.
//!
//! [`Importer::import`] exposes all of this as a stream of [`ImportEvent`]s;
//! [`Importer::run`] drains that stream, logs it and returns a [`RunReport`].
//!
//! [`write_note`]: crate::note::write_note

pub mod error;
mod pipeline;
mod stream;

pub use self::stream::{ImportEvent, KindSummary};
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::import::error::ErrorKind as ImportErrorKind;
use crate::note::Action;
use exn::ResultExt;
use futures::StreamExt;
use shelfnote_config::{LibraryKind, Settings};
use shelfnote_remote::Client;
use shelfnote_storage::BackendHandle;
use tracing::instrument;

pub struct Importer {
    client: Client,
    backend: BackendHandle,
    settings: Settings,
}

impl Importer {
    /// `settings` must already have their templates resolved; the importer
    /// only ever reads [`template`](shelfnote_config::LibrarySettings::template).
    pub fn new(client: Client, backend: BackendHandle, settings: Settings) -> Self {
        Self {
            client,
            backend,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Import every enabled library kind (or just `only`) and log progress.
    ///
    /// # Errors
    /// Only unusable settings are an error. Failures of single kinds,
    /// podcasts or notes are logged and counted in the returned report.
    #[instrument(skip(self), fields(vault = self.backend.name()))]
    pub async fn run(&self, only: Option<LibraryKind>) -> LibraryResult<RunReport> {
        let mut report = RunReport::default();
        let mut events = std::pin::pin!(self.import_inner(only));
        while let Some(event) = events.next().await {
            match event {
                Ok(ImportEvent::Started(kind)) => tracing::info!(%kind, "Importing"),
                Ok(ImportEvent::Discovered(kind, count)) => tracing::info!(%kind, count, "Fetched library items"),
                Ok(ImportEvent::Written(action)) => match &action {
                    Action::Created(path) => tracing::info!(path = %path.display(), "Created note"),
                    Action::Updated(path) => tracing::info!(path = %path.display(), "Updated note"),
                    Action::Unchanged(path) => tracing::debug!(path = %path.display(), "Note unchanged"),
                },
                Ok(ImportEvent::Failed(kind, err)) => {
                    tracing::error!(%kind, error = ?err, "Import failed");
                    report.failed.push(kind);
                },
                Ok(ImportEvent::Complete(kind, summary)) => {
                    tracing::info!(
                        %kind,
                        created = summary.created,
                        updated = summary.updated,
                        unchanged = summary.unchanged,
                        failed = summary.failed,
                        "{kind} fetched and notes created successfully!"
                    );
                    report.completed.push((kind, summary));
                },
                Err(err) if matches!(&*err, ImportErrorKind::Configuration) => {
                    return Err(err).or_raise(|| LibraryErrorKind::Import);
                },
                Err(err) => tracing::error!(error = ?err, "Skipped"),
            }
        }
        Ok(report)
    }
}

/// What happened during [`Importer::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Kinds that ran to the end, in the order they ran.
    pub completed: Vec<(LibraryKind, KindSummary)>,
    /// Kinds whose listing or base folder failed.
    pub failed: Vec<LibraryKind>,
}

impl RunReport {
    pub fn summary(&self, kind: LibraryKind) -> Option<&KindSummary> {
        self.completed.iter().find(|(completed, _)| *completed == kind).map(|(_, summary)| summary)
    }

    /// No kind failed and no single note or podcast failed either.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.completed.iter().all(|(_, summary)| summary.failed == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use serde_json::json;
    use shelfnote_config::LibrarySettings;
    use shelfnote_remote::transport::MockTransport;
    use shelfnote_storage::backend::MockBackend;
    use std::ops::Deref;
    use std::path::PathBuf;
    use std::sync::Arc;

    const EBOOKS: &str = "https://abs.example.org/api/libraries/lib_eb/items?sort=media.metadata.title";

    fn settings() -> Settings {
        Settings {
            host: "abs.example.org".into(),
            api_key: "secret".into(),
            ebooks: LibrarySettings {
                enable: true,
                dir: "ABS/Ebooks".into(),
                lib: "lib_eb".into(),
                template: "# {{title}}".into(),
                ..LibrarySettings::default()
            },
            ..Settings::default()
        }
    }

    fn importer(transport: MockTransport, backend: &Arc<MockBackend>, settings: Settings) -> Importer {
        let client = Client::new(Arc::new(transport), "abs.example.org", "secret");
        Importer::new(client, backend.clone(), settings)
    }

    #[test]
    fn test_report_success() {
        let mut report = RunReport::default();
        assert!(report.is_success());
        report.completed.push((LibraryKind::Ebooks, KindSummary { created: 2, ..KindSummary::default() }));
        assert!(report.is_success());
        assert_eq!(report.summary(LibraryKind::Ebooks).map(KindSummary::written), Some(2));
        assert!(report.summary(LibraryKind::Podcasts).is_none());
        report.completed.push((LibraryKind::Podcasts, KindSummary { failed: 1, ..KindSummary::default() }));
        assert!(!report.is_success());
    }

    #[tokio::test]
    async fn test_event_order() {
        let body = json!({ "results": [{ "id": "li_1", "media": { "metadata": { "title": "Earthsea", "authorNameLF": "Le Guin, Ursula" } } }] });
        let transport = MockTransport::default().with_body(EBOOKS, body.to_string());
        let backend = Arc::new(MockBackend::default());
        let importer = importer(transport, &backend, settings());

        let events: Vec<ImportEvent> = importer.import(None).try_collect().await.unwrap();
        assert!(matches!(events[0], ImportEvent::Started(LibraryKind::Ebooks)));
        assert!(matches!(events[1], ImportEvent::Discovered(LibraryKind::Ebooks, 1)));
        let path = PathBuf::from("ABS/Ebooks/Le Guin, Ursula/Earthsea.md");
        assert!(matches!(&events[2], ImportEvent::Written(Action::Created(p)) if *p == path));
        let ImportEvent::Complete(LibraryKind::Ebooks, summary) = events[3] else {
            panic!("expected Complete, got {:?}", events[3]);
        };
        assert_eq!(summary, KindSummary { created: 1, ..KindSummary::default() });
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_listing_ends_the_kind() {
        let transport = MockTransport::default().with_status(EBOOKS, 502);
        let backend = Arc::new(MockBackend::default());
        let importer = importer(transport, &backend, settings());

        let events: Vec<ImportEvent> = importer.import(None).try_collect().await.unwrap();
        assert_eq!(events.len(), 2);
        let ImportEvent::Failed(LibraryKind::Ebooks, err) = &events[1] else {
            panic!("expected Failed, got {:?}", events[1]);
        };
        assert_eq!(err.deref(), &ImportErrorKind::Fetch(LibraryKind::Ebooks));
        assert!(err.is_retryable());
        assert!(!backend.has_dir("ABS/Ebooks").await);
    }

    #[tokio::test]
    async fn test_missing_library_id_ends_the_kind() {
        let mut settings = settings();
        settings.ebooks.lib.clear();
        let backend = Arc::new(MockBackend::default());
        let importer = importer(MockTransport::default(), &backend, settings);

        let events: Vec<ImportEvent> = importer.import(None).try_collect().await.unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ImportEvent::Started(LibraryKind::Ebooks)));
        let ImportEvent::Failed(LibraryKind::Ebooks, err) = &events[1] else {
            panic!("expected Failed, got {:?}", events[1]);
        };
        assert_eq!(err.deref(), &ImportErrorKind::Configuration);
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_settings_end_the_stream() {
        let backend = Arc::new(MockBackend::default());
        let importer = importer(MockTransport::default(), &backend, Settings::default());
        let err = importer.run(None).await.unwrap_err();
        assert_eq!(err.deref(), &LibraryErrorKind::Import);
    }

    #[tokio::test]
    async fn test_only_filters_kinds() {
        let backend = Arc::new(MockBackend::default());
        let importer = importer(MockTransport::default(), &backend, settings());
        // Ebooks is the only enabled kind, so asking for podcasts leaves nothing to do.
        assert!(importer.run(Some(LibraryKind::Podcasts)).await.is_err());
    }
}
