use super::{Storage, StorageError};
use indexmap::IndexMap;

/// In-memory file table standing in for a project tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    files: IndexMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_files<I, P, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            files: files
                .into_iter()
                .map(|(path, content)| (path.into(), content.into()))
                .collect(),
        }
    }

    pub fn files(&self) -> &IndexMap<String, String> {
        &self.files
    }

    pub fn into_files(self) -> IndexMap<String, String> {
        self.files
    }

    /// Infallible write used when seeding a session's table.
    pub(crate) fn seed(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }
}

impl Storage for MemoryStorage {
    fn read(&self, path: &str) -> Result<String, StorageError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    fn write(&mut self, path: &str, content: &str) -> Result<(), StorageError> {
        self.files.insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn move_file(&mut self, from: &str, to: &str) -> Result<(), StorageError> {
        if self.files.contains_key(to) {
            return Err(StorageError::AlreadyExists(to.to_string()));
        }
        let content = self
            .files
            .shift_remove(from)
            .ok_or_else(|| StorageError::NotFound(from.to_string()))?;
        self.files.insert(to.to_string(), content);
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}
