//! Checkpoints recording the last reindex run per entity type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reindex_storage::Storage;

use crate::error::IndexingError;

/// Prefix of checkpoint names in the row store
const CHECKPOINT_PREFIX: &str = "reindex:";

/// Outcome of the last successful reindex pass of one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexCheckpoint {
    /// Entity type the pass covered
    pub entity_type: String,

    /// When the pass finished (milliseconds since epoch for JSON compatibility)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_run: DateTime<Utc>,

    /// Rows handed to the index
    pub rows_indexed: u64,

    /// True for date- or count-limited passes
    pub partial: bool,
}

impl ReindexCheckpoint {
    pub fn new(entity_type: impl Into<String>, rows_indexed: u64, partial: bool) -> Self {
        Self {
            entity_type: entity_type.into(),
            last_run: Utc::now(),
            rows_indexed,
            partial,
        }
    }

    /// Get the checkpoint key for storage
    pub fn checkpoint_key(entity_type: &str) -> String {
        format!("{}{}", CHECKPOINT_PREFIX, entity_type)
    }

    /// Serialize to JSON bytes for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, IndexingError> {
        serde_json::to_vec(self).map_err(IndexingError::from)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, IndexingError> {
        serde_json::from_slice(bytes).map_err(IndexingError::from)
    }
}

/// Persists reindex checkpoints.
pub trait CheckpointStore: Send + Sync {
    fn save(&self, checkpoint: &ReindexCheckpoint) -> Result<(), IndexingError>;

    fn load(&self, entity_type: &str) -> Result<Option<ReindexCheckpoint>, IndexingError>;

    /// All checkpoints, ordered by entity type.
    fn list(&self) -> Result<Vec<ReindexCheckpoint>, IndexingError>;
}

impl CheckpointStore for Storage {
    fn save(&self, checkpoint: &ReindexCheckpoint) -> Result<(), IndexingError> {
        let key = ReindexCheckpoint::checkpoint_key(&checkpoint.entity_type);
        self.put_checkpoint(&key, &checkpoint.to_bytes()?)?;
        Ok(())
    }

    fn load(&self, entity_type: &str) -> Result<Option<ReindexCheckpoint>, IndexingError> {
        let key = ReindexCheckpoint::checkpoint_key(entity_type);
        match self.get_checkpoint(&key)? {
            Some(bytes) => Ok(Some(ReindexCheckpoint::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<ReindexCheckpoint>, IndexingError> {
        self.list_checkpoints()?
            .into_iter()
            .filter(|(name, _)| name.starts_with(CHECKPOINT_PREFIX))
            .map(|(_, bytes)| ReindexCheckpoint::from_bytes(&bytes))
            .collect()
    }
}
