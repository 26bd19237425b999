use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No index found at {0}. Run 'codexref index' first")]
    IndexNotFound(PathBuf),

    #[error("Unsupported index format version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
}

pub type StorageResult<T> = Result<T, StorageError>;
