//! Storage layer error types.

use reindex_types::ReindexError;
use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// RocksDB operation failed
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Column family not found
    #[error("Column family not found: {0}")]
    ColumnFamilyNotFound(String),

    /// Key encoding/decoding error
    #[error("Key error: {0}")]
    Key(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Row rejected by the domain layer
    #[error("Invalid row: {0}")]
    InvalidRow(#[from] ReindexError),

    /// Operation on a session that was already closed
    #[error("Session is closed")]
    SessionClosed,

    /// Session has no open cursor
    #[error("No open cursor: call scroll() first")]
    NoCursor,
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
