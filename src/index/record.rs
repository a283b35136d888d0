//! Per-directory cache records.
//!
//! These are protobuf messages so the on-disk encoding is tagged and self-describing; the same
//! types are held in memory by [`DiskCachedIndex`](super::DiskCachedIndex).

use std::collections::BTreeMap;
use std::time::SystemTime;

use chrono::{DateTime, Utc};

/// Cached embeddings for the files directly inside one directory
#[derive(Clone, PartialEq, prost::Message)]
pub struct DirectoryIndex {
    /// Keyed by file name, not path
    #[prost(btree_map = "string, message", tag = "1")]
    pub files: BTreeMap<String, FileEmbeddings>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FileEmbeddings {
    /// Base name of the file
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub updated_at: Option<Timestamp>,
    #[prost(message, repeated, tag = "3")]
    pub embeddings: Vec<AnnotatedEmbedding>,
}

/// A vector tagged with the half-open byte range `[start, end)` it was computed from
#[derive(Clone, PartialEq, prost::Message)]
pub struct AnnotatedEmbedding {
    #[prost(uint64, tag = "1")]
    pub start: u64,
    #[prost(uint64, tag = "2")]
    pub end: u64,
    #[prost(float, repeated, tag = "3")]
    pub vector: Vec<f32>,
}

/// Wall-clock instant, laid out like `google.protobuf.Timestamp`
#[derive(Clone, Copy, PartialEq, Eq, Hash, prost::Message)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

impl DirectoryIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check that every stored byte range is non-empty and ordered
    #[inline]
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, file) in &self.files {
            if let Some(bad) = file.embeddings.iter().find(|e| e.start >= e.end) {
                return Err(format!(
                    "{name} has an empty or reversed byte range [{}, {})",
                    bad.start, bad.end
                ));
            }
        }
        Ok(())
    }
}

impl FileEmbeddings {
    #[inline]
    pub fn new(
        name: impl Into<String>,
        updated_at: DateTime<Utc>,
        embeddings: Vec<AnnotatedEmbedding>,
    ) -> Self {
        Self {
            name: name.into(),
            updated_at: Some(updated_at.into()),
            embeddings,
        }
    }

    /// Whether this entry was refreshed no earlier than `modified`, compared in whole seconds
    #[inline]
    pub fn is_fresh(&self, modified: SystemTime) -> bool {
        self.updated_at.is_some_and(|updated_at| {
            updated_at.seconds >= DateTime::<Utc>::from(modified).timestamp()
        })
    }
}

impl AnnotatedEmbedding {
    #[inline]
    pub fn new(start: u64, end: u64, vector: Vec<f32>) -> Self {
        Self { start, end, vector }
    }
}

impl Timestamp {
    #[inline]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let nanos = u32::try_from(self.nanos).ok()?;
        DateTime::from_timestamp(self.seconds, nanos)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    #[inline]
    fn from(value: DateTime<Utc>) -> Self {
        Self {
            seconds: value.timestamp(),
            nanos: i32::try_from(value.timestamp_subsec_nanos()).unwrap_or(0),
        }
    }
}
