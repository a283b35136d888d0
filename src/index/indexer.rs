use std::path::Path;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::record::{AnnotatedEmbedding, FileEmbeddings};
use super::{DiskCachedIndex, check_cancelled};
use crate::embeddings::chunking::{ChunkingConfig, read_chunks};
use crate::fs::{DirEntry, absolute, file_name};
use crate::{Result, TreesightError};

impl DiskCachedIndex {
    /// Index each path in turn, stopping at the first failure
    #[inline]
    pub fn index_paths<P: AsRef<Path>>(
        &mut self,
        cancel: &CancellationToken,
        paths: &[P],
        force_update: bool,
        chunk_size: usize,
        max_chunks: usize,
    ) -> Result<()> {
        for path in paths {
            self.index_path(cancel, path.as_ref(), force_update, chunk_size, max_chunks)?;
        }
        Ok(())
    }

    /// Load the caches already on disk under `paths`, then index them.
    ///
    /// Starting from the persisted records lets unchanged files be skipped, and keeps the
    /// entries of files outside `paths` when a directory's record is rewritten.
    #[inline]
    pub fn update_paths<P: AsRef<Path>>(
        &mut self,
        cancel: &CancellationToken,
        paths: &[P],
        force_update: bool,
        chunk_size: usize,
        max_chunks: usize,
    ) -> Result<()> {
        self.load_paths(cancel, paths)?;
        self.index_paths(cancel, paths, force_update, chunk_size, max_chunks)
    }

    /// Embed a file, or every file below a directory, and persist the touched records.
    ///
    /// Subdirectories are indexed before the directory's own files. Files whose cached entry
    /// is at least as new as their modification time are skipped unless `force_update` is set.
    /// The first error aborts the walk; records already written by this call stay on disk.
    #[inline]
    pub fn index_path(
        &mut self,
        cancel: &CancellationToken,
        path: &Path,
        force_update: bool,
        chunk_size: usize,
        max_chunks: usize,
    ) -> Result<()> {
        let chunking = ChunkingConfig::new(chunk_size, max_chunks)?;
        self.index_path_with(cancel, path, force_update, &chunking)
    }

    fn index_path_with(
        &mut self,
        cancel: &CancellationToken,
        path: &Path,
        force_update: bool,
        chunking: &ChunkingConfig,
    ) -> Result<()> {
        check_cancelled(cancel)?;
        debug!("DiskCachedIndex.index_path({})", path.display());

        let path = absolute(path).map_err(|e| TreesightError::io(path, e))?;
        let metadata = self
            .fs
            .metadata(&path)
            .map_err(|e| TreesightError::io(&path, e))?;

        let (dir_path, candidates) = if metadata.is_dir {
            let entries = self
                .fs
                .read_dir(&path)
                .map_err(|e| TreesightError::io(&path, e))?;

            let (subdirs, files): (Vec<DirEntry>, Vec<DirEntry>) =
                entries.into_iter().partition(|entry| entry.metadata.is_dir);

            for subdir in subdirs {
                if self.indexable_directory(&subdir.name) {
                    self.index_path_with(cancel, &subdir.path, force_update, chunking)?;
                } else {
                    info!("Ignored {}", subdir.path.display());
                }
            }

            (path, files)
        } else {
            let dir_path = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let entry = DirEntry {
                name: file_name(&path),
                path,
                metadata,
            };
            (dir_path, vec![entry])
        };

        let files =
            self.filter_indexable_files(candidates, force_update, self.index.get(&dir_path))?;

        for file in files {
            let embeddings = self.embed_file_with(cancel, &file.path, chunking)?;
            self.index
                .entry(dir_path.clone())
                .or_default()
                .files
                .insert(file.name, embeddings);
            info!("Indexed {}", file.path.display());
        }

        if self
            .index
            .get(&dir_path)
            .is_some_and(|dir_index| !dir_index.is_empty())
        {
            self.save_path(&dir_path)?;
        }

        Ok(())
    }

    /// Chunk a file and embed every chunk, without touching the store.
    ///
    /// Chunks are sent to the embedder `chunks_per_call` at a time. Any failing batch fails the
    /// whole file.
    #[inline]
    pub fn embed_file(
        &self,
        cancel: &CancellationToken,
        path: &Path,
        chunk_size: usize,
        max_chunks: usize,
    ) -> Result<FileEmbeddings> {
        let chunking = ChunkingConfig::new(chunk_size, max_chunks)?;
        let path = absolute(path).map_err(|e| TreesightError::io(path, e))?;
        self.embed_file_with(cancel, &path, &chunking)
    }

    fn embed_file_with(
        &self,
        cancel: &CancellationToken,
        path: &Path,
        chunking: &ChunkingConfig,
    ) -> Result<FileEmbeddings> {
        let embedder = self.embedder()?;
        debug!("Embedding {}", path.display());

        let timestamp = Utc::now();

        let file = self
            .fs
            .open(path)
            .map_err(|e| TreesightError::io(path, e))?;
        let chunks = read_chunks(file, path, chunking)?;

        let mut annotated = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.config.chunks_per_call.max(1)) {
            check_cancelled(cancel)?;

            let texts: Vec<String> = batch.iter().map(|chunk| chunk.content.clone()).collect();
            let vectors = embedder.embed(&texts).map_err(TreesightError::Embedding)?;

            if vectors.len() != batch.len() {
                return Err(TreesightError::Embedding(anyhow::anyhow!(
                    "Embedder returned {} vectors for {} chunks of {}",
                    vectors.len(),
                    batch.len(),
                    path.display()
                )));
            }

            debug!(
                "Embedded {} chunks of {} ({} dimensions)",
                batch.len(),
                path.display(),
                vectors.first().map_or(0, Vec::len)
            );

            annotated.extend(
                batch
                    .iter()
                    .zip(vectors)
                    .map(|(chunk, vector)| AnnotatedEmbedding::new(chunk.start, chunk.end, vector)),
            );
        }

        Ok(FileEmbeddings::new(file_name(path), timestamp, annotated))
    }
}
