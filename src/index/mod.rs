// Directory-scoped embedding cache
// One DirectoryIndex per directory, persisted as a dotfile inside that directory


pub mod filter;
pub mod indexer;
pub mod persist;
pub mod record;
pub mod search;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::config::IndexConfig;
use crate::embeddings::Embedder;
use crate::fs::{FileSystem, OsFileSystem};
use crate::{Result, TreesightError};

pub use record::{AnnotatedEmbedding, DirectoryIndex, FileEmbeddings, Timestamp};
pub use search::{VectorSearchResult, cosine_similarity};

/// Embedding index over directory trees, cached on disk one directory at a time.
///
/// The in-memory store maps absolute directory paths to their [`DirectoryIndex`]. A subtree is
/// represented by one record per directory level; parent/child relations are recovered from
/// path prefixes when needed. There is no internal locking, callers needing shared access must
/// wrap the whole index in their own mutex.
pub struct DiskCachedIndex {
    index: BTreeMap<PathBuf, DirectoryIndex>,
    embedder: Option<Box<dyn Embedder>>,
    fs: Box<dyn FileSystem>,
    config: IndexConfig,
}

impl DiskCachedIndex {
    /// Create an index that reads and writes the real filesystem
    #[inline]
    pub fn new(embedder: Option<Box<dyn Embedder>>, config: IndexConfig) -> Self {
        Self::with_filesystem(embedder, Box::new(OsFileSystem), config)
    }

    #[inline]
    pub fn with_filesystem(
        embedder: Option<Box<dyn Embedder>>,
        fs: Box<dyn FileSystem>,
        config: IndexConfig,
    ) -> Self {
        Self {
            index: BTreeMap::new(),
            embedder,
            fs,
            config,
        }
    }

    #[inline]
    pub fn set_embedder(&mut self, embedder: Box<dyn Embedder>) {
        self.embedder = Some(embedder);
    }

    #[inline]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    #[inline]
    pub fn config_mut(&mut self) -> &mut IndexConfig {
        &mut self.config
    }

    /// The cached record for an absolute directory path
    #[inline]
    pub fn directory_index(&self, dir: &Path) -> Option<&DirectoryIndex> {
        self.index.get(dir)
    }

    /// Absolute paths of every directory that currently has a record
    #[inline]
    pub fn directories(&self) -> impl Iterator<Item = &Path> {
        self.index.keys().map(PathBuf::as_path)
    }

    /// Put a record in the store, replacing whatever was cached for `dir`
    #[inline]
    pub fn insert_directory_index(
        &mut self,
        dir: impl Into<PathBuf>,
        dir_index: DirectoryIndex,
    ) -> Option<DirectoryIndex> {
        self.index.insert(dir.into(), dir_index)
    }

    /// Absolute paths of every file with cached embeddings
    #[inline]
    pub fn indexed_files(&self) -> Vec<PathBuf> {
        self.index
            .iter()
            .flat_map(|(dir, dir_index)| dir_index.files.keys().map(|name| dir.join(name)))
            .collect()
    }

    /// Cached files at or below `root`
    #[inline]
    pub fn indexed_files_under(&self, root: &Path) -> Vec<PathBuf> {
        self.index
            .iter()
            .filter(|(dir, _)| dir.starts_with(root))
            .flat_map(|(dir, dir_index)| dir_index.files.keys().map(|name| dir.join(name)))
            .filter(|file| file.starts_with(root))
            .collect()
    }

    fn embedder(&self) -> Result<&dyn Embedder> {
        self.embedder
            .as_deref()
            .ok_or_else(|| TreesightError::Config("No embedder set".to_string()))
    }
}

/// Bail out with [`TreesightError::Cancelled`] once the token fires
#[inline]
pub fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(TreesightError::Cancelled);
    }
    Ok(())
}
