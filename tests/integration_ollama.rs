#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local Ollama instance
// Run with: cargo test --test integration_ollama -- --ignored

use std::env;
use std::fs;
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use treesight::config::{IndexConfig, OllamaConfig};
use treesight::embeddings::OllamaClient;
use treesight::index::DiskCachedIndex;

const TEST_MODEL: &str = "nomic-embed-text:latest";
const DEFAULT_OLLAMA_HOST: &str = "localhost";
const DEFAULT_OLLAMA_PORT: u16 = 11434;

fn create_integration_test_client() -> OllamaClient {
    let host = env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string());
    let port = env::var("OLLAMA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_OLLAMA_PORT);
    let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| TEST_MODEL.to_string());

    let config = OllamaConfig {
        host,
        port,
        model,
        batch_size: 5,
        ..OllamaConfig::default()
    };

    OllamaClient::new(&config)
        .expect("Failed to create Ollama client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(3)
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_health_check() {
    init_test_tracing();

    let client = create_integration_test_client();
    let result = client.health_check();
    assert!(
        result.is_ok(),
        "Health check should succeed with local Ollama: {:?}",
        result
    );
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_batch_embeddings() {
    init_test_tracing();

    let client = create_integration_test_client();
    let test_texts: Vec<String> = (0..12)
        .map(|i| format!("Test document number {} about file indexing.", i + 1))
        .collect();

    let embeddings = client
        .generate_embeddings_batch(&test_texts)
        .expect("batch embedding succeeded");
    assert_eq!(embeddings.len(), test_texts.len());

    let first_dim = embeddings[0].len();
    assert!(first_dim >= 100, "Embedding should have reasonable dimensions");
    for (i, embedding) in embeddings.iter().enumerate() {
        assert_eq!(embedding.len(), first_dim, "Embedding {i} dimensions differ");
    }

    info!(
        "Generated {} embeddings with {} dimensions each",
        embeddings.len(),
        first_dim
    );
}

#[test]
#[ignore = "requires a local Ollama instance"]
fn real_ollama_index_and_search() {
    init_test_tracing();

    let temp_dir = TempDir::new().expect("temp dir");
    let root = temp_dir.path();
    fs::write(
        root.join("cooking.txt"),
        "Simmer the tomato sauce with garlic and basil for twenty minutes.",
    )
    .expect("write");
    fs::write(
        root.join("network.txt"),
        "TCP retransmits a segment when the acknowledgement timer expires.",
    )
    .expect("write");

    let cancel = CancellationToken::new();
    let mut index = DiskCachedIndex::new(
        Some(Box::new(create_integration_test_client())),
        IndexConfig::default(),
    );
    index
        .index_path(&cancel, root, false, 512, 8)
        .expect("index temp dir");

    let results = index
        .search(&cancel, "pasta recipe with tomatoes", 2)
        .expect("search");
    for result in &results {
        debug!("{:.4} {}", result.score, result.file_path.display());
    }

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].file_path, root.join("cooking.txt"));
}
