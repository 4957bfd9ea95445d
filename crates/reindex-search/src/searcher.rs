//! Read-side document counts.
//!
//! The index is written by the rebuild and read by the application; this
//! module only answers how many documents it holds, overall or per type.

use tantivy::collector::Count;
use tantivy::query::TermQuery;
use tantivy::schema::IndexRecordOption;
use tantivy::{IndexReader, Term};
use tracing::debug;

use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::schema::SearchSchema;

/// Counts live documents in the index.
pub struct IndexSearcher {
    reader: IndexReader,
    schema: SearchSchema,
}

impl IndexSearcher {
    /// Create a new searcher from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        Ok(Self {
            reader: index.reader()?,
            schema: index.schema().clone(),
        })
    }

    /// Reload the reader to see recent commits.
    pub fn reload(&self) -> Result<(), SearchError> {
        self.reader.reload()?;
        debug!("Reloaded search reader");
        Ok(())
    }

    /// Get the number of indexed documents.
    pub fn num_docs(&self) -> u64 {
        let searcher = self.reader.searcher();
        searcher
            .segment_readers()
            .iter()
            .map(|r| r.num_docs() as u64)
            .sum()
    }

    /// Number of indexed documents of one entity type.
    pub fn count_type(&self, entity_type: &str) -> Result<u64, SearchError> {
        let searcher = self.reader.searcher();
        let term = Term::from_field_text(self.schema.doc_type, entity_type);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let count = searcher.search(&query, &Count)?;
        Ok(count as u64)
    }
}
