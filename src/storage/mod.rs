//! Storage backends the commit step writes through.
//!
//! [`DiskStorage`] performs real file operations under a project root;
//! [`MemoryStorage`] implements the same operations over an in-memory
//! path → content table for tests and dry runs. Commit logic only sees the
//! [`Storage`] trait.

pub mod disk;
pub mod errors;
pub mod memory;

pub use disk::DiskStorage;
pub use errors::StorageError;
pub use memory::MemoryStorage;

/// Minimal capability set needed to commit a session.
///
/// Paths are project-relative, `/`-separated keys as stored in a
/// [`Session`](crate::Session).
pub trait Storage {
    fn read(&self, path: &str) -> Result<String, StorageError>;

    /// Create or replace `path`, creating parent directories as needed.
    fn write(&mut self, path: &str, content: &str) -> Result<(), StorageError>;

    /// Rename `from` to `to`. Fails if `from` is missing.
    fn move_file(&mut self, from: &str, to: &str) -> Result<(), StorageError>;

    fn exists(&self, path: &str) -> bool;
}
