use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TreesightError>;

#[derive(Error, Debug)]
pub enum TreesightError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed index record at {}: {source}", path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: prost::DecodeError,
    },

    #[error("Invalid index record at {}: {reason}", path.display())]
    InvalidRecord { path: PathBuf, reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Vector dimension mismatch: query has {expected} dimensions, stored vector has {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Embedding error: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl TreesightError {
    /// Attach a path to a raw IO error
    #[inline]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for TreesightError {
    #[inline]
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub mod commands;
pub mod config;
pub mod embeddings;
pub mod fs;
pub mod index;
