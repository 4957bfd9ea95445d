//! Error types for the reindex pipeline.

use reindex_search::SearchError;
use reindex_storage::StorageError;
use reindex_types::ReindexError;
use thiserror::Error;

/// Errors that can occur while rebuilding the search index
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Row store operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Search index error
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Generic index sink failure
    #[error("Index error: {0}")]
    Index(String),

    /// A recalculation hook rejected a row
    #[error("Recalculation of {entity_type} #{id} failed: {reason}")]
    Recalculation {
        entity_type: String,
        id: u64,
        reason: String,
    },

    /// Entity type is not registered
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    /// JSON encoding/decoding errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Domain type error
    #[error(transparent)]
    Domain(#[from] ReindexError),
}

impl From<serde_json::Error> for IndexingError {
    fn from(err: serde_json::Error) -> Self {
        IndexingError::Serialization(err.to_string())
    }
}
