use super::merge::{compose, merge};
use crate::error::{ErrorKind as LibraryErrorKind, Result as LibraryResult};
use crate::note::error::{ErrorKind as NoteErrorKind, Result as NoteResult};
use crate::record::RenderRecord;
use exn::ResultExt;
use shelfnote_storage::BackendHandle;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// The outcome of (successfully) writing a single note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// The note didn't exist and was created.
    Created(PathBuf),
    /// The note existed and its section or frontmatter changed.
    Updated(PathBuf),
    /// The note already had this content; nothing was written.
    Unchanged(PathBuf),
}

impl Action {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(path) | Self::Updated(path) | Self::Unchanged(path) => path,
        }
    }
}

/// Creates the note at `path` or merges `body` into the existing one.
///
/// Missing parent folders are created first. An existing note is read,
/// merged in memory and written back with a single
/// [`write`](shelfnote_storage::StorageBackend::write), or not at all when
/// the merge changes nothing.
///
/// # Errors
/// Returns [`Exn<LibraryErrorKind::Note>`](LibraryErrorKind::Note) raised
/// from an inner [`Exn<NoteErrorKind>`](NoteErrorKind).
pub async fn write_note(
    backend: &BackendHandle,
    path: &Path,
    record: &RenderRecord,
    body: &str,
) -> LibraryResult<Action> {
    write_note_inner(backend, path, record, body).await.or_raise(|| LibraryErrorKind::Note)
}

#[instrument(level = "debug", skip(backend, record, body), fields(path = %path.display()))]
pub(crate) async fn write_note_inner(
    backend: &BackendHandle,
    path: &Path,
    record: &RenderRecord,
    body: &str,
) -> NoteResult<Action> {
    let storage = || NoteErrorKind::Storage(path.to_path_buf());

    if !backend.exists(path).await.or_raise(storage)? {
        if let Some(folder) = path.parent().filter(|folder| !folder.as_os_str().is_empty())
            && !backend.exists(folder).await.or_raise(storage)?
        {
            backend.create_dir(folder).await.or_raise(storage)?;
            tracing::debug!(folder = %folder.display(), "Created folder");
        }
        backend.write(path, compose(body).as_bytes()).await.or_raise(storage)?;
        return Ok(Action::Created(path.to_path_buf()));
    }

    let current = backend.read(path).await.or_raise(storage)?;
    let current = String::from_utf8(current).or_raise(|| NoteErrorKind::Encoding(path.to_path_buf()))?;
    let merged = merge(&current, body, record);
    if merged == current {
        return Ok(Action::Unchanged(path.to_path_buf()));
    }
    backend.write(path, merged.as_bytes()).await.or_raise(storage)?;
    Ok(Action::Updated(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::METADATA_START;
    use serde_json::json;
    use shelfnote_storage::backend::MockBackend;
    use std::ops::Deref;
    use std::sync::Arc;

    fn record() -> RenderRecord {
        [("title", json!("Dune"))].into_iter().collect()
    }

    fn handle(mock: &Arc<MockBackend>) -> BackendHandle {
        mock.clone()
    }

    #[tokio::test]
    async fn test_creates_note_and_folders() {
        let mock = Arc::new(MockBackend::default());
        let path = Path::new("ABS/Audiobooks/Herbert, Frank/Dune/1 | Dune.md");
        let action = write_note(&handle(&mock), path, &record(), "# Dune").await.unwrap();
        assert_eq!(action, Action::Created(path.to_path_buf()));
        assert!(mock.has_dir("ABS/Audiobooks/Herbert, Frank/Dune").await);
        assert!(mock.has_dir("ABS").await);
        assert_eq!(
            mock.read_string(path).await.as_deref(),
            Some(format!("{METADATA_START}\n# Dune\n%%\n\n# Your notes here").as_str())
        );
        assert_eq!(mock.write_count(), 1);
    }

    #[tokio::test]
    async fn test_note_at_vault_root() {
        let mock = Arc::new(MockBackend::default());
        let action = write_note(&handle(&mock), Path::new("Dune.md"), &record(), "body").await.unwrap();
        assert_eq!(action.path(), Path::new("Dune.md"));
        assert_eq!(mock.write_count(), 1);
    }

    #[tokio::test]
    async fn test_updates_existing_note_with_one_write() {
        let existing = format!("---\ntitle: {{{{title}}}}\n---\n{METADATA_START}\nold\n%%\n\nMy notes.");
        let mock = Arc::new(MockBackend::with_files([("Dune.md", existing.as_str())]));
        let action = write_note(&handle(&mock), Path::new("Dune.md"), &record(), "new").await.unwrap();
        assert_eq!(action, Action::Updated("Dune.md".into()));
        assert_eq!(mock.write_count(), 1);
        assert_eq!(
            mock.read_string("Dune.md").await.as_deref(),
            Some(format!("---\ntitle: Dune\n---\n{METADATA_START}\nnew\n%%\n\nMy notes.").as_str())
        );
    }

    #[tokio::test]
    async fn test_unchanged_note_is_not_written() {
        let mock = Arc::new(MockBackend::default());
        let backend = handle(&mock);
        let path = Path::new("ABS/Dune.md");
        write_note(&backend, path, &record(), "same").await.unwrap();
        let action = write_note(&backend, path, &record(), "same").await.unwrap();
        assert_eq!(action, Action::Unchanged(path.to_path_buf()));
        assert_eq!(mock.write_count(), 1);
    }

    #[tokio::test]
    async fn test_binary_note_is_an_encoding_error() {
        let mock = Arc::new(MockBackend::default());
        let backend = handle(&mock);
        backend.write(Path::new("Dune.md"), &[0xff, 0xfe, 0x00]).await.unwrap();
        let err = write_note_inner(&backend, Path::new("Dune.md"), &record(), "body").await.unwrap_err();
        assert_eq!(err.deref(), &NoteErrorKind::Encoding("Dune.md".into()));
    }

    #[tokio::test]
    async fn test_folder_in_the_way_is_a_storage_error() {
        let mock = Arc::new(MockBackend::with_files([("ABS", "not a folder")]));
        let err = write_note_inner(&handle(&mock), Path::new("ABS/Dune.md"), &record(), "body").await.unwrap_err();
        assert_eq!(err.deref(), &NoteErrorKind::Storage("ABS/Dune.md".into()));
    }
}
