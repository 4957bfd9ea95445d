//! # reindex-search
//!
//! Full-text index of entity rows using Tantivy.
//!
//! ## Features
//! - Embedded Tantivy index with MmapDirectory for persistence
//! - One document per row, keyed `{entity_type}:{id}`, replaced on reindex
//! - Batched commits and an optimize pass that merges segments
//! - Document counts overall and per entity type

pub mod document;
pub mod error;
pub mod index;
pub mod indexer;
pub mod schema;
pub mod searcher;

pub use document::{extract_row_text, row_doc_id, row_to_doc};
pub use error::SearchError;
pub use index::{open_or_create_index, SearchIndex, SearchIndexConfig};
pub use indexer::{OptimizeStats, SearchIndexer};
pub use schema::{build_row_schema, SearchSchema};
pub use searcher::IndexSearcher;
