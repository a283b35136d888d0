use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::record::AnnotatedEmbedding;
use super::{DiskCachedIndex, check_cancelled};
use crate::{Result, TreesightError};

/// A stored chunk ranked against a query vector
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchResult {
    /// Cosine similarity to the query, higher is closer
    pub score: f64,
    pub file_path: PathBuf,
    pub start: u64,
    pub end: u64,
    pub vector: Vec<f32>,
    /// The text of `[start, end)`, filled in by [`DiskCachedIndex::populate_results`]
    pub content: Option<String>,
}

/// Cosine similarity of two equal-length vectors.
///
/// A zero-magnitude vector scores 0.
#[inline]
pub fn cosine_similarity(query: &[f32], stored: &[f32]) -> Result<f64> {
    if query.len() != stored.len() {
        return Err(TreesightError::DimensionMismatch {
            expected: query.len(),
            found: stored.len(),
        });
    }

    let (dot, query_norm, stored_norm) = query.iter().zip(stored).fold(
        (0.0_f64, 0.0_f64, 0.0_f64),
        |(dot, qn, sn), (&q, &s)| {
            let (q, s) = (f64::from(q), f64::from(s));
            (q.mul_add(s, dot), q.mul_add(q, qn), s.mul_add(s, sn))
        },
    );

    let magnitude = query_norm.sqrt() * stored_norm.sqrt();
    if magnitude == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / magnitude)
}

impl DiskCachedIndex {
    /// Embed `query`, rank every cached chunk against it, and read the top `k` from disk
    #[inline]
    pub fn search(
        &self,
        cancel: &CancellationToken,
        query: &str,
        k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        let query_vector = self.vectorize(query)?;
        let mut results = self.search_with_vector(cancel, &query_vector, k)?;
        self.populate_results(cancel, &mut results)?;
        Ok(results)
    }

    /// Embed a single string with the configured embedder
    #[inline]
    pub fn vectorize(&self, content: &str) -> Result<Vec<f32>> {
        let embedder = self.embedder()?;

        let mut vectors = embedder
            .embed(&[content.to_string()])
            .map_err(TreesightError::Embedding)?;

        if vectors.len() != 1 {
            return Err(TreesightError::Embedding(anyhow::anyhow!(
                "Expected 1 vector from the embedder, got {}",
                vectors.len()
            )));
        }
        Ok(vectors.swap_remove(0))
    }

    /// Brute-force scan of every cached vector, best `k` first.
    ///
    /// Scan order is fixed by the sorted store, and the sort is stable, so equal scores come
    /// back in the same order on every call over unchanged data. Contents are left empty.
    #[inline]
    pub fn search_with_vector(
        &self,
        cancel: &CancellationToken,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        let mut scored: Vec<(f64, &Path, &str, &AnnotatedEmbedding)> = Vec::new();

        for (dir, dir_index) in &self.index {
            check_cancelled(cancel)?;

            for (name, file) in &dir_index.files {
                for embedding in &file.embeddings {
                    let score = cosine_similarity(query, &embedding.vector)?;
                    scored.push((score, dir.as_path(), name.as_str(), embedding));
                }
            }
        }

        debug!("Scored {} cached vectors", scored.len());

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, dir, name, embedding)| VectorSearchResult {
                score,
                file_path: dir.join(name),
                start: embedding.start,
                end: embedding.end,
                vector: embedding.vector.clone(),
                content: None,
            })
            .collect())
    }

    /// Read each result's byte range from disk.
    ///
    /// All ranges are read before any result is updated, so a failure leaves `results` as it
    /// was.
    #[inline]
    pub fn populate_results(
        &self,
        cancel: &CancellationToken,
        results: &mut [VectorSearchResult],
    ) -> Result<()> {
        let mut contents = Vec::with_capacity(results.len());
        for result in results.iter() {
            check_cancelled(cancel)?;
            contents.push(self.read_range(&result.file_path, result.start, result.end)?);
        }

        for (result, content) in results.iter_mut().zip(contents) {
            result.content = Some(content);
        }
        Ok(())
    }

    fn read_range(&self, path: &Path, start: u64, end: u64) -> Result<String> {
        let mut file = self
            .fs
            .open(path)
            .map_err(|e| TreesightError::io(path, e))?;

        file.seek(SeekFrom::Start(start))
            .map_err(|e| TreesightError::io(path, e))?;

        let len = end.saturating_sub(start);
        let mut buf = Vec::new();
        file.take(len)
            .read_to_end(&mut buf)
            .map_err(|e| TreesightError::io(path, e))?;

        if (buf.len() as u64) < len {
            return Err(TreesightError::io(
                path,
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("expected {len} bytes at offset {start}, found {}", buf.len()),
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
