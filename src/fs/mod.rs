// Filesystem capability
// Every disk access made by the index goes through `FileSystem` so tests can swap in memory

#[cfg(test)]
mod tests;

pub mod memory;

use std::fs;
use std::io::{self, Read, Seek};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

pub use memory::MemoryFileSystem;

/// The subset of file metadata the index relies on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub is_dir: bool,
    /// Regular file, or a symlink resolving to one
    pub is_file: bool,
    pub len: u64,
    pub modified: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub metadata: Metadata,
}

pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Filesystem operations used for indexing, hydration and persistence
pub trait FileSystem {
    fn metadata(&self, path: &Path) -> io::Result<Metadata>;

    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek + '_>>;

    /// Immediate children of `path`, sorted by name.
    ///
    /// Symlinks are not followed into directories: a link to a directory, or a dangling link,
    /// is reported as neither a directory nor a file.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Create or truncate `path` and write `contents` to it
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Every entry at or below `root` in pre-order, `root` included
    fn walk(&self, root: &Path) -> io::Result<Vec<DirEntry>> {
        let metadata = self.metadata(root)?;
        let mut entries = vec![DirEntry {
            name: file_name(root),
            path: root.to_path_buf(),
            metadata,
        }];

        if metadata.is_dir {
            for child in self.read_dir(root)? {
                if child.metadata.is_dir {
                    entries.extend(self.walk(&child.path)?);
                } else {
                    entries.push(child);
                }
            }
        }

        Ok(entries)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut file = self.open(path)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    #[inline]
    fn metadata(&self, path: &Path) -> io::Result<Metadata> {
        fs::metadata(path).and_then(|meta| convert_metadata(&meta))
    }

    #[inline]
    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek + '_>> {
        Ok(Box::new(fs::File::open(path)?))
    }

    #[inline]
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = fs::read_dir(path)?
            .map(|entry| {
                let entry = entry?;
                let path = entry.path();
                let metadata = if entry.file_type()?.is_symlink() {
                    symlink_metadata(&path)?
                } else {
                    convert_metadata(&entry.metadata()?)?
                };
                Ok(DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    path,
                    metadata,
                })
            })
            .collect::<io::Result<Vec<_>>>()?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    #[inline]
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    #[inline]
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    #[inline]
    fn walk(&self, root: &Path) -> io::Result<Vec<DirEntry>> {
        walkdir::WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| {
                let entry = entry.map_err(io::Error::from)?;
                Ok(DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    path: entry.path().to_path_buf(),
                    metadata: convert_metadata(&entry.metadata().map_err(io::Error::from)?)?,
                })
            })
            .collect()
    }
}

fn convert_metadata(meta: &fs::Metadata) -> io::Result<Metadata> {
    Ok(Metadata {
        is_dir: meta.is_dir(),
        is_file: meta.is_file(),
        len: meta.len(),
        modified: meta.modified()?,
    })
}

/// Metadata for a symlink seen during a listing: the target's when it is a regular file
fn symlink_metadata(path: &Path) -> io::Result<Metadata> {
    match fs::metadata(path) {
        Ok(target) if target.is_file() => return convert_metadata(&target),
        _ => {}
    }

    let link = fs::symlink_metadata(path)?;
    Ok(Metadata {
        is_dir: false,
        is_file: false,
        len: link.len(),
        modified: link.modified()?,
    })
}

/// Resolve `path` against the working directory and fold away `.` and `..`
#[inline]
pub fn absolute(path: &Path) -> io::Result<PathBuf> {
    let joined = std::path::absolute(path)?;
    let mut cleaned = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other),
        }
    }
    Ok(cleaned)
}

/// Final path component as a string, empty for roots
#[inline]
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
