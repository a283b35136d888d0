use std::path::{Path, PathBuf};

use prost::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::record::DirectoryIndex;
use super::{DiskCachedIndex, check_cancelled};
use crate::fs::absolute;
use crate::{Result, TreesightError};

impl DiskCachedIndex {
    #[inline]
    pub fn save_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<()> {
        for path in paths {
            self.save_path(path.as_ref())?;
        }
        Ok(())
    }

    /// Write the cached record for `dir` to its dotfile, replacing any previous one
    #[inline]
    pub fn save_path(&self, dir: &Path) -> Result<()> {
        debug!("DiskCachedIndex.save_path({})", dir.display());

        let dir = absolute(dir).map_err(|e| TreesightError::io(dir, e))?;
        let dir_index = self.index.get(&dir).ok_or_else(|| {
            TreesightError::Config(format!("No index found for {}", dir.display()))
        })?;

        let buf = dir_index.encode_to_vec();

        let dotfile_path = dir.join(&self.config.dotfile_name);
        debug!("Writing index cache to {}", dotfile_path.display());

        self.fs
            .write(&dotfile_path, &buf)
            .map_err(|e| TreesightError::io(&dotfile_path, e))?;

        info!("Saved index cache to {}", dotfile_path.display());
        Ok(())
    }

    /// Read one dotfile into the store, replacing the record of the directory containing it
    #[inline]
    pub fn load_dotfile(&mut self, dotfile: &Path) -> Result<()> {
        debug!("DiskCachedIndex.load_dotfile({})", dotfile.display());

        let dotfile = absolute(dotfile).map_err(|e| TreesightError::io(dotfile, e))?;
        let buf = self
            .fs
            .read(&dotfile)
            .map_err(|e| TreesightError::io(&dotfile, e))?;

        let dir_index =
            DirectoryIndex::decode(buf.as_slice()).map_err(|source| TreesightError::Serialization {
                path: dotfile.clone(),
                source,
            })?;

        dir_index
            .validate()
            .map_err(|reason| TreesightError::InvalidRecord {
                path: dotfile.clone(),
                reason,
            })?;

        let dir = dotfile
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.index.insert(dir, dir_index);

        info!("Loaded index cache at {}", dotfile.display());
        Ok(())
    }

    #[inline]
    pub fn load_paths<P: AsRef<Path>>(
        &mut self,
        cancel: &CancellationToken,
        paths: &[P],
    ) -> Result<()> {
        for path in paths {
            self.load_path(cancel, path.as_ref())?;
        }
        Ok(())
    }

    /// Load every dotfile at or below `path`; a file path loads from its parent directory
    #[inline]
    pub fn load_path(&mut self, cancel: &CancellationToken, path: &Path) -> Result<()> {
        check_cancelled(cancel)?;
        debug!("DiskCachedIndex.load_path({})", path.display());

        let path = absolute(path).map_err(|e| TreesightError::io(path, e))?;
        let metadata = self
            .fs
            .metadata(&path)
            .map_err(|e| TreesightError::io(&path, e))?;

        let dir = if metadata.is_dir {
            path
        } else {
            path.parent().map(Path::to_path_buf).unwrap_or_default()
        };

        for dotfile in self.dotfiles_in_path(cancel, &dir)? {
            self.load_dotfile(&dotfile)?;
        }
        Ok(())
    }

    #[inline]
    pub fn clear_paths<P: AsRef<Path>>(
        &mut self,
        cancel: &CancellationToken,
        paths: &[P],
    ) -> Result<()> {
        for path in paths {
            self.clear_path(cancel, path.as_ref())?;
        }
        Ok(())
    }

    /// Delete every dotfile at or below `path` and drop the matching records from memory.
    ///
    /// Ancestors of `path` keep their records.
    #[inline]
    pub fn clear_path(&mut self, cancel: &CancellationToken, path: &Path) -> Result<()> {
        let path = absolute(path).map_err(|e| TreesightError::io(path, e))?;

        for dotfile in self.dotfiles_in_path(cancel, &path)? {
            debug!("Removing dotfile {}", dotfile.display());

            self.fs
                .remove_file(&dotfile)
                .map_err(|e| TreesightError::io(&dotfile, e))?;

            if let Some(dir) = dotfile.parent() {
                self.index.remove(dir);
            }
            info!("Cleared index cache at {}", dotfile.display());
        }
        Ok(())
    }

    /// Every dotfile at or below `path`, in walk order
    fn dotfiles_in_path(&self, cancel: &CancellationToken, path: &Path) -> Result<Vec<PathBuf>> {
        check_cancelled(cancel)?;

        let entries = self
            .fs
            .walk(path)
            .map_err(|e| TreesightError::io(path, e))?;

        let mut dotfiles = Vec::new();
        for entry in entries {
            check_cancelled(cancel)?;
            if entry.metadata.is_file && entry.name == self.config.dotfile_name {
                dotfiles.push(entry.path);
            }
        }
        Ok(dotfiles)
    }
}
