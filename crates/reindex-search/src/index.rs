//! Tantivy index management.
//!
//! Handles index creation and opening. An index directory created with
//! another schema is rejected instead of being reused.

use std::path::{Path, PathBuf};

use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info};

use reindex_types::Settings;

use crate::error::SearchError;
use crate::schema::{build_row_schema, SearchSchema};

/// Default memory budget for IndexWriter (50MB)
const DEFAULT_WRITER_MEMORY_MB: usize = 50;

/// Search index configuration
#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    /// Path to index directory
    pub index_path: PathBuf,
    /// Memory budget for writer in MB
    pub writer_memory_mb: usize,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self::new("./search-index")
    }
}

impl SearchIndexConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }

    /// Index location and writer budget from application settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.expanded_search_index_path()).with_memory_mb(settings.writer_memory_mb)
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb;
        self
    }
}

/// Tantivy index together with its resolved schema fields.
pub struct SearchIndex {
    index: Index,
    schema: SearchSchema,
    config: SearchIndexConfig,
}

impl SearchIndex {
    /// Open existing index or create new one.
    pub fn open_or_create(config: SearchIndexConfig) -> Result<Self, SearchError> {
        let index = open_or_create_index(&config.index_path)?;
        let schema = SearchSchema::from_schema(index.schema())?;

        info!(path = ?config.index_path, "Opened search index");
        Ok(Self {
            index,
            schema,
            config,
        })
    }

    pub fn schema(&self) -> &SearchSchema {
        &self.schema
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Create an IndexWriter with the configured memory budget.
    ///
    /// Tantivy allows one writer per index directory at a time.
    pub fn writer(&self) -> Result<IndexWriter, SearchError> {
        let memory_budget = self.config.writer_memory_mb * 1024 * 1024;
        let writer = self.index.writer(memory_budget)?;
        debug!(memory_mb = self.config.writer_memory_mb, "Created index writer");
        Ok(writer)
    }

    /// Create an IndexReader. It only sees later commits after `reload()`.
    pub fn reader(&self) -> Result<IndexReader, SearchError> {
        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        Ok(reader)
    }

    pub fn path(&self) -> &Path {
        &self.config.index_path
    }

    /// Check if index exists at the configured path
    pub fn exists(&self) -> bool {
        self.config.index_path.join("meta.json").exists()
    }
}

/// Open an existing index or create a new one in `path`.
pub fn open_or_create_index(path: &Path) -> Result<Index, SearchError> {
    if path.join("meta.json").exists() {
        debug!(path = ?path, "Opening existing index");
        return Ok(Index::open_in_dir(path)?);
    }
    info!(path = ?path, "Creating new index");
    std::fs::create_dir_all(path)?;
    let schema = build_row_schema();
    Ok(Index::create_in_dir(path, schema.schema().clone())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_new_index() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("index");

        let index = SearchIndex::open_or_create(SearchIndexConfig::new(&path)).unwrap();
        assert!(index.exists());
        assert_eq!(index.path(), path.as_path());
    }

    #[test]
    fn test_reopen_existing_index() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchIndexConfig::new(temp_dir.path());

        let first = SearchIndex::open_or_create(config.clone()).unwrap();
        drop(first);
        let second = SearchIndex::open_or_create(config).unwrap();
        assert!(second.exists());
    }

    #[test]
    fn test_open_rejects_foreign_index() {
        let temp_dir = TempDir::new().unwrap();
        let mut builder = tantivy::schema::Schema::builder();
        builder.add_text_field("title", tantivy::schema::TEXT);
        Index::create_in_dir(temp_dir.path(), builder.build()).unwrap();

        let result = SearchIndex::open_or_create(SearchIndexConfig::new(temp_dir.path()));
        assert!(matches!(result, Err(SearchError::SchemaMismatch(_))));
    }

    #[test]
    fn test_create_writer_and_reader() {
        let temp_dir = TempDir::new().unwrap();
        let index = SearchIndex::open_or_create(SearchIndexConfig::new(temp_dir.path())).unwrap();

        let _writer = index.writer().unwrap();
        let _reader = index.reader().unwrap();
    }

    #[test]
    fn test_config_from_settings() {
        let settings = Settings {
            search_index_path: "/var/lib/reindex/index".to_string(),
            writer_memory_mb: 120,
            ..Default::default()
        };
        let config = SearchIndexConfig::from_settings(&settings);
        assert_eq!(config.index_path, PathBuf::from("/var/lib/reindex/index"));
        assert_eq!(config.writer_memory_mb, 120);
    }

    #[test]
    fn test_config_default() {
        let config = SearchIndexConfig::default();
        assert_eq!(config.index_path, PathBuf::from("./search-index"));
        assert_eq!(config.writer_memory_mb, DEFAULT_WRITER_MEMORY_MB);
    }
}
