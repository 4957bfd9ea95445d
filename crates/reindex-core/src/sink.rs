//! Index sink collaborator: where reindexed rows go.

use tracing::info;

use reindex_search::SearchIndexer;
use reindex_types::EntityRow;

use crate::error::IndexingError;

/// Receives rows for the full-text index.
///
/// Writes may be buffered until `flush`. Flushed writes are never rolled
/// back by the reindex loop.
pub trait IndexSink: Send + Sync {
    /// Add or replace the document of a row. `modified_at_field` names the
    /// row field holding the modification time, if the type has one.
    fn index_object(
        &self,
        row: &EntityRow,
        modified_at_field: Option<&str>,
    ) -> Result<(), IndexingError>;

    /// Make buffered writes durable and visible.
    fn flush(&self) -> Result<(), IndexingError>;

    /// Compact the index after a type has been reindexed.
    fn optimize(&self, entity_type: &str) -> Result<(), IndexingError>;
}

impl IndexSink for SearchIndexer {
    fn index_object(
        &self,
        row: &EntityRow,
        modified_at_field: Option<&str>,
    ) -> Result<(), IndexingError> {
        Ok(self.index_row(row, modified_at_field)?)
    }

    fn flush(&self) -> Result<(), IndexingError> {
        self.commit()?;
        Ok(())
    }

    fn optimize(&self, entity_type: &str) -> Result<(), IndexingError> {
        let stats = SearchIndexer::optimize(self)?;
        info!(
            entity = %entity_type,
            segments = stats.segments_after,
            "Index optimized"
        );
        Ok(())
    }
}
