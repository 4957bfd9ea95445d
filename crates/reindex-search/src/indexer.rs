//! Search indexer for adding entity rows to the Tantivy index.
//!
//! The indexer wraps IndexWriter with shared access via Arc<Mutex>.
//! Documents are not visible until commit() is called.

use std::sync::{Arc, Mutex, MutexGuard};

use tantivy::{Index, IndexWriter, Term};
use tracing::{debug, info};

use reindex_types::EntityRow;

use crate::document::{row_doc_id, row_to_doc};
use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::schema::SearchSchema;

/// Result of an optimize pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    /// Searchable segments before merging
    pub segments_before: usize,
    /// Searchable segments after merging
    pub segments_after: usize,
    /// Files removed by garbage collection
    pub files_deleted: usize,
}

/// Manages document indexing operations.
///
/// Wraps IndexWriter for shared access across components.
/// Commit batches documents for visibility.
pub struct SearchIndexer {
    index: Index,
    writer: Arc<Mutex<IndexWriter>>,
    schema: SearchSchema,
}

impl SearchIndexer {
    /// Create a new indexer from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        let writer = index.writer()?;
        let schema = index.schema().clone();

        Ok(Self {
            index: index.index().clone(),
            writer: Arc::new(Mutex::new(writer)),
            schema,
        })
    }

    fn lock_writer(&self) -> Result<MutexGuard<'_, IndexWriter>, SearchError> {
        self.writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))
    }

    /// Index a row, taking its modification time from `modified_at_field`.
    ///
    /// If a document for the same type and id exists, it will be replaced.
    pub fn index_row(
        &self,
        row: &EntityRow,
        modified_at_field: Option<&str>,
    ) -> Result<(), SearchError> {
        let doc = row_to_doc(&self.schema, row, modified_at_field);
        let writer = self.lock_writer()?;

        // Delete existing document with same ID (for update)
        let term = Term::from_field_text(
            self.schema.doc_id,
            &row_doc_id(&row.entity_type, row.id),
        );
        writer.delete_term(term);
        writer.add_document(doc)?;

        debug!(entity = %row.entity_type, id = row.id, "Indexed row");
        Ok(())
    }

    /// Commit pending changes to make them searchable.
    ///
    /// This is expensive - batch document adds and commit periodically.
    pub fn commit(&self) -> Result<u64, SearchError> {
        let mut writer = self.lock_writer()?;
        let opstamp = writer.commit()?;
        debug!(opstamp, "Committed index changes");
        Ok(opstamp)
    }

    /// Commit pending changes, merge all searchable segments into one and
    /// remove files no longer referenced by the index.
    pub fn optimize(&self) -> Result<OptimizeStats, SearchError> {
        let mut writer = self.lock_writer()?;
        writer.commit()?;

        let segment_ids = self.index.searchable_segment_ids()?;
        let segments_before = segment_ids.len();
        if segments_before > 1 {
            writer.merge(&segment_ids).wait()?;
        }
        let gc = writer.garbage_collect_files().wait()?;
        let segments_after = self.index.searchable_segment_ids()?.len();

        let stats = OptimizeStats {
            segments_before,
            segments_after,
            files_deleted: gc.deleted_files.len(),
        };
        info!(
            segments_before,
            segments_after,
            files_deleted = stats.files_deleted,
            "Optimized search index"
        );
        Ok(stats)
    }

}
