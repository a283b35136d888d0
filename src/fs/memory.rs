use std::collections::BTreeMap;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use super::{DirEntry, FileSystem, Metadata, ReadSeek, file_name};

#[derive(Debug, Clone)]
enum Node {
    Dir { modified: SystemTime },
    File { data: Vec<u8>, modified: SystemTime },
}

impl Node {
    fn metadata(&self) -> Metadata {
        match self {
            Self::Dir { modified } => Metadata {
                is_dir: true,
                is_file: false,
                len: 0,
                modified: *modified,
            },
            Self::File { data, modified } => Metadata {
                is_dir: false,
                is_file: true,
                len: data.len() as u64,
                modified: *modified,
            },
        }
    }
}

/// In-memory filesystem keyed by absolute path.
///
/// Clones share the same tree, so a test can keep a handle while the index owns another.
/// Writing a file creates any missing parent directories.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    nodes: Arc<Mutex<BTreeMap<PathBuf, Node>>>,
}

impl MemoryFileSystem {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Node>> {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    pub fn create_dir_all(&self, path: &Path) {
        let mut nodes = self.lock();
        insert_dirs(&mut nodes, path);
    }

    #[inline]
    pub fn write_file(&self, path: &Path, contents: impl Into<Vec<u8>>) {
        self.write_file_at(path, contents, SystemTime::now());
    }

    /// Write a file with an explicit modification time
    #[inline]
    pub fn write_file_at(&self, path: &Path, contents: impl Into<Vec<u8>>, modified: SystemTime) {
        let mut nodes = self.lock();
        if let Some(parent) = path.parent() {
            insert_dirs(&mut nodes, parent);
        }
        nodes.insert(
            path.to_path_buf(),
            Node::File {
                data: contents.into(),
                modified,
            },
        );
    }

    /// Change the modification time of an existing entry
    #[inline]
    pub fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()> {
        let mut nodes = self.lock();
        match nodes.get_mut(path) {
            Some(Node::Dir { modified } | Node::File { modified, .. }) => {
                *modified = time;
                Ok(())
            }
            None => Err(not_found(path)),
        }
    }

    #[inline]
    pub fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }
}

fn insert_dirs(nodes: &mut BTreeMap<PathBuf, Node>, path: &Path) {
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            continue;
        }
        nodes
            .entry(ancestor.to_path_buf())
            .or_insert_with(|| Node::Dir {
                modified: SystemTime::now(),
            });
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file or directory", path.display()),
    )
}

impl FileSystem for MemoryFileSystem {
    #[inline]
    fn metadata(&self, path: &Path) -> io::Result<Metadata> {
        self.lock()
            .get(path)
            .map(Node::metadata)
            .ok_or_else(|| not_found(path))
    }

    #[inline]
    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek + '_>> {
        let nodes = self.lock();
        match nodes.get(path) {
            Some(Node::File { data, .. }) => Ok(Box::new(Cursor::new(data.clone()))),
            Some(Node::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    #[inline]
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let nodes = self.lock();
        match nodes.get(path) {
            Some(Node::Dir { .. }) => {}
            Some(Node::File { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("{} is not a directory", path.display()),
                ));
            }
            None => return Err(not_found(path)),
        }

        Ok(nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path))
            .map(|(child, node)| DirEntry {
                name: file_name(child),
                path: child.clone(),
                metadata: node.metadata(),
            })
            .collect())
    }

    #[inline]
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut nodes = self.lock();
        match path.parent().map(|parent| nodes.get(parent)) {
            Some(Some(Node::Dir { .. })) | None => {}
            _ => return Err(not_found(path)),
        }
        if let Some(Node::Dir { .. }) = nodes.get(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            ));
        }
        nodes.insert(
            path.to_path_buf(),
            Node::File {
                data: contents.to_vec(),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    #[inline]
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut nodes = self.lock();
        match nodes.get(path) {
            Some(Node::File { .. }) => {
                nodes.remove(path);
                Ok(())
            }
            Some(Node::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{} is a directory", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }
}
