//! End-to-end test infrastructure for the reindexer.
//!
//! Provides a shared TestHarness over a real RocksDB row store and a real
//! Tantivy index, plus row builders for the default entity types.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use reindex_core::{EntityRegistry, IndexSink, IndexingError, RebuildConfig, Reindexer};
use reindex_search::{IndexSearcher, SearchIndex, SearchIndexConfig, SearchIndexer};
use reindex_storage::Storage;
use reindex_types::EntityRow;

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Row store
    pub storage: Arc<Storage>,
    /// Search index
    pub index: SearchIndex,
    /// Path of the search index directory
    pub index_path: PathBuf,
}

impl TestHarness {
    /// Create a new test harness with temp directory, storage and index.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let storage = Arc::new(
            Storage::open(&temp_dir.path().join("db")).expect("Failed to open test storage"),
        );
        let index_path = temp_dir.path().join("search-index");
        let index = SearchIndex::open_or_create(SearchIndexConfig::new(index_path.clone()))
            .expect("Failed to open search index");

        Self {
            _temp_dir: temp_dir,
            storage,
            index,
            index_path,
        }
    }

    /// Index writer over the harness index. Only one may exist at a time.
    pub fn indexer(&self) -> Arc<SearchIndexer> {
        Arc::new(SearchIndexer::new(&self.index).expect("Failed to create indexer"))
    }

    /// Reindexer with the default registry, writing checkpoints to storage.
    pub fn reindexer(&self, sink: Arc<dyn IndexSink>, config: RebuildConfig) -> Reindexer {
        Reindexer::new(
            self.storage.clone(),
            sink,
            EntityRegistry::with_defaults(),
            config,
        )
        .with_checkpoints(self.storage.clone())
    }

    /// Fresh searcher over the last commit.
    pub fn searcher(&self) -> IndexSearcher {
        IndexSearcher::new(&self.index).expect("Failed to open searcher")
    }

    /// Documents of `entity_type` in the index.
    pub fn doc_count(&self, entity_type: &str) -> u64 {
        self.searcher()
            .count_type(entity_type)
            .expect("Failed to count documents")
    }

    pub fn put_rows(&self, rows: &[EntityRow]) {
        self.storage.put_rows(rows).expect("Failed to put rows");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Index sink wrapper counting flushes and optimize calls.
pub struct CountingSink {
    inner: Arc<SearchIndexer>,
    flushes: AtomicUsize,
    optimized: AtomicUsize,
}

impl CountingSink {
    pub fn new(inner: Arc<SearchIndexer>) -> Self {
        Self {
            inner,
            flushes: AtomicUsize::new(0),
            optimized: AtomicUsize::new(0),
        }
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn optimize_count(&self) -> usize {
        self.optimized.load(Ordering::SeqCst)
    }
}

impl IndexSink for CountingSink {
    fn index_object(
        &self,
        row: &EntityRow,
        modified_at_field: Option<&str>,
    ) -> Result<(), IndexingError> {
        IndexSink::index_object(self.inner.as_ref(), row, modified_at_field)
    }

    fn flush(&self) -> Result<(), IndexingError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        IndexSink::flush(self.inner.as_ref())
    }

    fn optimize(&self, entity_type: &str) -> Result<(), IndexingError> {
        self.optimized.fetch_add(1, Ordering::SeqCst);
        IndexSink::optimize(self.inner.as_ref(), entity_type)
    }
}

/// Reference instant rows are dated against.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Invoice `id` modified `days` days after [`base_time`] (negative: before).
pub fn invoice(id: u64, days: i64) -> EntityRow {
    EntityRow::new("Invoice", id)
        .with_field("id", id)
        .with_field("subject", format!("Invoice {}", id))
        .with_field(
            "positions",
            json!([{ "quantity": 2, "unitPrice": "50.00", "vat": 0.19 }]),
        )
        .with_timestamp("lastUpdate", base_time() + Duration::days(days))
}

/// Task `id` modified `days` days after [`base_time`].
pub fn task(id: u64, days: i64) -> EntityRow {
    EntityRow::new("Task", id)
        .with_field("id", id)
        .with_field("title", format!("Task {}", id))
        .with_timestamp("lastUpdate", base_time() + Duration::days(days))
}

/// History record with primary key `pk`. History rows carry no modification field.
pub fn history_record(pk: u64, entity_name: &str, entity_id: u64) -> EntityRow {
    EntityRow::new("HistoryRecord", pk)
        .with_field("pk", pk)
        .with_field("entityName", entity_name)
        .with_field("entityId", entity_id)
}
