//! In-memory storage backend for testing.

use crate::StorageBackend;
use crate::error::{ErrorKind, Result};
use crate::path::validate as validate_path;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory storage backend for testing.
///
/// Files and folders live behind a [`RwLock`], so all trait methods can
/// operate on `&self`. Every call to [`write`](StorageBackend::write) is
/// counted, which lets tests assert that a note update happened in exactly
/// one write (or none at all).
///
/// # Examples
///
/// ```
/// use shelfnote_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("ABS/Audiobooks/Dune.md", "# Dune"),
/// ]);
/// assert!(backend.exists(Path::new("ABS/Audiobooks")).await.unwrap());
/// assert_eq!(backend.read_string("ABS/Audiobooks/Dune.md").await.as_deref(), Some("# Dune"));
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
    writes: AtomicUsize,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files. Parent folders of every
    /// file are registered as existing.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = BTreeMap::new();
        let mut dirs = BTreeSet::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            dirs.extend(ancestors(&validated));
            map.insert(validated, data.into());
        }
        Self {
            name: "mock".to_string(),
            files: RwLock::new(map),
            dirs: RwLock::new(dirs),
            writes: AtomicUsize::new(0),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of [`write`](StorageBackend::write) calls made so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Read a file as UTF-8, `None` if it doesn't exist.
    pub async fn read_string(&self, path: impl AsRef<Path>) -> Option<String> {
        let path = validate_path(path.as_ref()).ok()?;
        let files = self.files.read().await;
        files.get(&path).map(|data| String::from_utf8_lossy(data).into_owned())
    }

    /// All file paths currently stored, sorted.
    pub async fn paths(&self) -> Vec<PathBuf> {
        self.files.read().await.keys().cloned().collect()
    }

    /// Whether a folder has been created (explicitly or as a parent).
    pub async fn has_dir(&self, path: impl AsRef<Path>) -> bool {
        match validate_path(path.as_ref()) {
            Ok(path) => self.dirs.read().await.contains(&path),
            Err(_) => false,
        }
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

/// Every proper ancestor folder of a (validated, relative) path.
fn ancestors(path: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    path.ancestors().skip(1).filter(|p| !p.as_os_str().is_empty()).map(Path::to_path_buf)
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        if self.files.read().await.contains_key(&path) {
            return Ok(true);
        }
        Ok(self.dirs.read().await.contains(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        let data = self.files.read().await.get(&path).cloned();
        data.ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        if self.dirs.read().await.contains(&path) {
            exn::bail!(ErrorKind::AlreadyExists(path));
        }
        // A file can't double as a parent folder.
        let blocker = {
            let files = self.files.read().await;
            ancestors(&path).find(|ancestor| files.contains_key(ancestor))
        };
        if let Some(blocker) = blocker {
            exn::bail!(ErrorKind::AlreadyExists(blocker));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.dirs.write().await.extend(ancestors(&path));
        self.files.write().await.insert(path, data.to_vec());
        Ok(())
    }

    async fn create_dir(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        if self.files.read().await.contains_key(&path) {
            exn::bail!(ErrorKind::AlreadyExists(path));
        }
        let mut dirs = self.dirs.write().await;
        dirs.extend(ancestors(&path));
        dirs.insert(path);
        Ok(())
    }
}
