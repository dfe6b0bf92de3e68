use crate::safety::SafetyError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("destination already exists: {0}")]
    AlreadyExists(String),

    #[error("file is not valid UTF-8: {0}")]
    NotUtf8(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Unsafe(#[from] SafetyError),
}
