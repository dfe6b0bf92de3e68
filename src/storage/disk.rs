use super::{Storage, StorageError};
use crate::safety::RootGuard;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Real file operations confined to a project root.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    guard: RootGuard,
}

impl DiskStorage {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        Ok(Self {
            guard: RootGuard::new(root)?,
        })
    }

    pub fn root(&self) -> &Path {
        self.guard.root()
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl Storage for DiskStorage {
    fn read(&self, path: &str) -> Result<String, StorageError> {
        let absolute = self.guard.resolve(path)?;
        fs::read_to_string(&absolute).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            ErrorKind::InvalidData => StorageError::NotUtf8(absolute.clone()),
            _ => io_error(&absolute, source),
        })
    }

    fn write(&mut self, path: &str, content: &str) -> Result<(), StorageError> {
        let absolute = self.guard.resolve(path)?;
        atomic_write(&absolute, content.as_bytes())
    }

    fn move_file(&mut self, from: &str, to: &str) -> Result<(), StorageError> {
        let source = self.guard.resolve(from)?;
        let target = self.guard.resolve(to)?;

        if !source.is_file() {
            return Err(StorageError::NotFound(from.to_string()));
        }
        if target.exists() {
            return Err(StorageError::AlreadyExists(to.to_string()));
        }
        ensure_parent(&target)?;

        // rename(2) fails across filesystems; fall back to copy + remove.
        if fs::rename(&source, &target).is_err() {
            fs::copy(&source, &target).map_err(|e| io_error(&target, e))?;
            fs::remove_file(&source).map_err(|e| io_error(&source, e))?;
        }
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.guard
            .resolve(path)
            .map(|absolute| absolute.is_file())
            .unwrap_or(false)
    }
}

fn ensure_parent(path: &Path) -> Result<PathBuf, StorageError> {
    let parent = path.parent().ok_or_else(|| {
        io_error(
            path,
            std::io::Error::new(ErrorKind::InvalidInput, "Path has no parent directory"),
        )
    })?;
    fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    Ok(parent.to_path_buf())
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write lands or the previous content stays. The mtime is
/// bumped afterwards so incremental build tools notice the change.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), StorageError> {
    let parent = ensure_parent(path)?;

    // Same directory keeps the final rename on one filesystem
    let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| io_error(&parent, e))?;
    temp.write_all(content).map_err(|e| io_error(path, e))?;
    temp.as_file().sync_all().map_err(|e| io_error(path, e))?;
    temp.persist(path).map_err(|e| io_error(path, e.error))?;

    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now).map_err(|e| io_error(path, e))?;

    Ok(())
}
