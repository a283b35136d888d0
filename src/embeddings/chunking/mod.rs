
use std::io::{self, Read};
use std::path::Path;

use tracing::debug;

use crate::{Result, TreesightError};

/// One fixed-width window of a file, ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChunk {
    /// Position of this chunk within the file
    pub chunk_index: usize,
    /// Byte offset of the first byte, inclusive
    pub start: u64,
    /// Byte offset past the last byte
    pub end: u64,
    /// The chunk content, decoded lossily for the embedder
    pub content: String,
}

/// Configuration for fixed-width chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Width of each window in bytes
    pub chunk_size: usize,
    /// Windows beyond this count are dropped
    pub max_chunks: usize,
}

impl ChunkingConfig {
    #[inline]
    pub fn new(chunk_size: usize, max_chunks: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(TreesightError::Config(
                "Chunk size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            chunk_size,
            max_chunks,
        })
    }

    /// Largest number of bytes that can end up in any chunk
    #[inline]
    pub fn byte_limit(&self) -> u64 {
        (self.chunk_size as u64).saturating_mul(self.max_chunks as u64)
    }
}

/// Split `data` into consecutive windows of `chunk_size` bytes, keeping at most `max_chunks`.
///
/// The last window may be shorter. Windows never overlap.
#[inline]
pub fn chunk_bytes(data: &[u8], config: &ChunkingConfig) -> Result<Vec<ContentChunk>> {
    if config.chunk_size == 0 {
        return Err(TreesightError::Config(
            "Chunk size must be greater than 0".to_string(),
        ));
    }

    let chunks: Vec<ContentChunk> = data
        .chunks(config.chunk_size)
        .take(config.max_chunks)
        .enumerate()
        .map(|(chunk_index, bytes)| {
            let start = chunk_index as u64 * config.chunk_size as u64;
            ContentChunk {
                chunk_index,
                start,
                end: start + bytes.len() as u64,
                content: String::from_utf8_lossy(bytes).into_owned(),
            }
        })
        .collect();

    debug!(
        "Chunked {} bytes into {} chunks of up to {} bytes",
        data.len(),
        chunks.len(),
        config.chunk_size
    );

    Ok(chunks)
}

/// Read only as much of `reader` as the chunk limit allows, then chunk it.
///
/// `path` is only used to label read errors.
#[inline]
pub fn read_chunks<R: Read>(
    reader: R,
    path: &Path,
    config: &ChunkingConfig,
) -> Result<Vec<ContentChunk>> {
    if config.chunk_size == 0 {
        return Err(TreesightError::Config(
            "Chunk size must be greater than 0".to_string(),
        ));
    }
    let data =
        read_limited(reader, config.byte_limit()).map_err(|e| TreesightError::io(path, e))?;
    chunk_bytes(&data, config)
}

fn read_limited<R: Read>(reader: R, limit: u64) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    reader.take(limit).read_to_end(&mut data)?;
    Ok(data)
}
