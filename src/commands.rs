use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::embeddings::OllamaClient;
use crate::index::{DiskCachedIndex, VectorSearchResult};

/// Build an index backed by the configured Ollama server
#[inline]
pub fn open_index(config: &Config) -> Result<DiskCachedIndex> {
    let client = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;
    Ok(DiskCachedIndex::new(
        Some(Box::new(client)),
        config.index.clone(),
    ))
}

fn paths_or_current_dir(paths: &[PathBuf]) -> Vec<PathBuf> {
    if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths.to_vec()
    }
}

/// Embed every indexable file under `paths` and write the per-directory caches
#[inline]
pub fn index_paths(
    config: &Config,
    paths: &[PathBuf],
    force: bool,
    chunk_size: Option<usize>,
    max_chunks: Option<usize>,
) -> Result<()> {
    let paths = paths_or_current_dir(paths);
    let chunk_size = chunk_size.unwrap_or(config.index.chunk_size);
    let max_chunks = max_chunks.unwrap_or(config.index.max_chunks);

    let mut index = open_index(config)?;
    let cancel = CancellationToken::new();

    index
        .update_paths(&cancel, &paths, force, chunk_size, max_chunks)
        .context("Indexing failed")?;

    println!(
        "Indexed {} paths, {} files tracked",
        paths.len(),
        index.indexed_files().len()
    );
    Ok(())
}

/// Load the caches under `paths` and print the closest chunks to `query`
#[inline]
pub fn search(
    config: &Config,
    query: &str,
    paths: &[PathBuf],
    limit: usize,
    show_vectors: bool,
) -> Result<()> {
    let paths = paths_or_current_dir(paths);

    let mut index = open_index(config)?;
    let cancel = CancellationToken::new();

    index
        .load_paths(&cancel, &paths)
        .context("Failed to load index caches")?;

    if index.directories().next().is_none() {
        warn!("No index caches found, run 'treesight index' first");
        println!("No indexed files found.");
        return Ok(());
    }

    let results = index
        .search(&cancel, query, limit)
        .context("Search failed")?;
    info!("Search for '{}' returned {} results", query, results.len());

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for result in &results {
        print_result(result, show_vectors);
    }
    Ok(())
}

fn print_result(result: &VectorSearchResult, show_vectors: bool) {
    println!(
        "{:.4}  {} [{}..{}]",
        result.score,
        result.file_path.display(),
        result.start,
        result.end
    );

    if let Some(content) = &result.content {
        for line in content.lines() {
            println!("    {line}");
        }
    }

    if show_vectors {
        println!("    vector: {:?}", result.vector);
    }
    println!();
}

/// Print every file with cached embeddings under `paths`
#[inline]
pub fn list_indexed(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let paths = paths_or_current_dir(paths);

    let mut index = DiskCachedIndex::new(None, config.index.clone());
    let cancel = CancellationToken::new();
    index
        .load_paths(&cancel, &paths)
        .context("Failed to load index caches")?;

    let files = index.indexed_files();
    if files.is_empty() {
        println!("No indexed files found.");
        println!("Use 'treesight index <path>' to build an index.");
        return Ok(());
    }

    for file in &files {
        println!("{}", file.display());
    }
    println!();
    println!("{} files indexed", files.len());
    Ok(())
}

/// Delete the cache files under `paths`
#[inline]
pub fn clear(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let paths = paths_or_current_dir(paths);

    let mut index = DiskCachedIndex::new(None, config.index.clone());
    let cancel = CancellationToken::new();

    index
        .clear_paths(&cancel, &paths)
        .context("Failed to clear index caches")?;

    for path in &paths {
        println!("Cleared index caches under {}", path.display());
    }
    Ok(())
}

/// Write the current configuration to disk, creating the defaults on first use
#[inline]
pub fn write_config(config: &Config) -> Result<()> {
    config.save()?;
    println!("Configuration saved to {}", config.config_file_path().display());
    Ok(())
}
