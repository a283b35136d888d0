//! Rules deciding which directory entries get embedded

use std::io::Read;
use std::path::Path;

use mime_guess::mime;
use tracing::info;

use super::DiskCachedIndex;
use super::record::{DirectoryIndex, FileEmbeddings};
use crate::fs::DirEntry;
use crate::{Result, TreesightError};

/// How many leading bytes are inspected when sniffing for binary content
pub const SNIFF_LEN: usize = 1024;

const BINARY_TOP_LEVEL_TYPES: &[&str] = &["image", "audio", "video", "font", "model"];

const BINARY_APPLICATION_PREFIXES: &[&str] = &[
    "application/octet-stream",
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/x-gzip",
    "application/x-tar",
    "application/x-bzip",
    "application/x-7z-compressed",
    "application/x-rar",
    "application/x-xz",
    "application/zstd",
    "application/java-archive",
    "application/wasm",
    "application/x-msdownload",
    "application/x-executable",
    "application/x-sharedlib",
    "application/x-shockwave-flash",
    "application/msword",
    "application/vnd.ms-",
    "application/vnd.openxmlformats",
    "application/vnd.oasis.opendocument",
    "application/x-sqlite3",
    "application/vnd.sqlite3",
];

/// Names starting with a dot are hidden
#[inline]
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// False when the extension is known to belong to a non-text media type.
///
/// Names without a recognised extension pass; the content sniff decides for those.
#[inline]
pub fn has_text_media_type(name: &str) -> bool {
    let Some(guess) = mime_guess::from_path(name).first() else {
        return true;
    };

    if guess.type_() == mime::TEXT {
        return true;
    }

    let top_level = guess.type_().as_str();
    if BINARY_TOP_LEVEL_TYPES.contains(&top_level) {
        return false;
    }

    let essence = guess.essence_str();
    !BINARY_APPLICATION_PREFIXES
        .iter()
        .any(|prefix| essence.starts_with(prefix))
}

/// Heuristic text check over the start of a file.
///
/// Rejects invalid UTF-8, the replacement character, and control characters other than tab,
/// newline, carriage return and form feed. A multi-byte character cut off by the end of the
/// sample is ignored.
#[inline]
pub fn looks_like_text(sample: &[u8]) -> bool {
    let sample = sample.get(..SNIFF_LEN).unwrap_or(sample);
    let text = match std::str::from_utf8(sample) {
        Ok(text) => text,
        Err(err) if err.error_len().is_none() => {
            std::str::from_utf8(sample.get(..err.valid_up_to()).unwrap_or_default())
                .unwrap_or_default()
        }
        Err(_) => return false,
    };

    !text
        .chars()
        .any(|c| c == '\u{FFFD}' || (c < ' ' && !matches!(c, '\t' | '\n' | '\r' | '\x0c')))
}

impl DiskCachedIndex {
    /// Whether recursion should descend into a directory with this name
    #[inline]
    pub fn indexable_directory(&self, name: &str) -> bool {
        !self.config.ignore_dirs.iter().any(|ignored| ignored == name)
    }

    /// Apply every inclusion rule to a single non-directory entry.
    ///
    /// Checks run cheapest first: regular file, hidden name, media type, ignore list, content
    /// sniff, and finally staleness against `previous` unless `force_update` is set.
    #[inline]
    pub fn indexable_file(
        &self,
        entry: &DirEntry,
        force_update: bool,
        previous: Option<&FileEmbeddings>,
    ) -> Result<bool> {
        if !entry.metadata.is_file {
            return Ok(false);
        }

        let name = entry.name.as_str();
        if is_hidden(name) || !has_text_media_type(name) {
            return Ok(false);
        }

        if self.config.ignore_files.iter().any(|ignored| ignored == name) {
            return Ok(false);
        }

        if !self.sniff_text(&entry.path)? {
            return Ok(false);
        }

        if !force_update && previous.is_some_and(|prev| prev.is_fresh(entry.metadata.modified)) {
            return Ok(false);
        }

        Ok(true)
    }

    pub(super) fn filter_indexable_files(
        &self,
        entries: Vec<DirEntry>,
        force_update: bool,
        dir_index: Option<&DirectoryIndex>,
    ) -> Result<Vec<DirEntry>> {
        let mut kept = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.metadata.is_dir {
                continue;
            }

            let previous = dir_index.and_then(|index| index.files.get(&entry.name));
            if self.indexable_file(&entry, force_update, previous)? {
                kept.push(entry);
            } else {
                info!("Ignored {}", entry.path.display());
            }
        }
        Ok(kept)
    }

    fn sniff_text(&self, path: &Path) -> Result<bool> {
        let file = self
            .fs
            .open(path)
            .map_err(|e| TreesightError::io(path, e))?;
        let mut sample = Vec::with_capacity(SNIFF_LEN);
        file.take(SNIFF_LEN as u64)
            .read_to_end(&mut sample)
            .map_err(|e| TreesightError::io(path, e))?;
        Ok(looks_like_text(&sample))
    }
}
