//! End-to-end rebuild tests: RocksDB rows in, Tantivy documents out.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use e2e_tests::{base_time, history_record, invoice, task, CountingSink, TestHarness};
use reindex_core::{
    CheckpointStore, IndexSink, IndexingError, RebuildConfig, RebuildOutcome, TypeOutcome,
    TypeReport,
};
use reindex_search::SearchIndexer;
use reindex_types::{EntityRow, ReindexSettings};

/// Sink recording row ids in the order they arrive.
struct RecordingSink {
    inner: Arc<SearchIndexer>,
    ids: Mutex<Vec<u64>>,
}

impl IndexSink for RecordingSink {
    fn index_object(
        &self,
        row: &EntityRow,
        modified_at_field: Option<&str>,
    ) -> Result<(), IndexingError> {
        self.ids.lock().unwrap().push(row.id);
        IndexSink::index_object(self.inner.as_ref(), row, modified_at_field)
    }

    fn flush(&self) -> Result<(), IndexingError> {
        IndexSink::flush(self.inner.as_ref())
    }

    fn optimize(&self, entity_type: &str) -> Result<(), IndexingError> {
        IndexSink::optimize(self.inner.as_ref(), entity_type)
    }
}

fn seed(harness: &TestHarness) {
    harness.put_rows(&[
        invoice(1, -30),
        invoice(2, -1),
        invoice(3, 5),
        invoice(4, 40),
        task(1, -10),
        task(2, 3),
        history_record(10, "Invoice", 1),
        history_record(11, "Invoice", 3),
        history_record(12, "Task", 2),
    ]);
}

#[test]
fn test_full_rebuild_of_two_types() {
    let harness = TestHarness::new();
    seed(&harness);

    let reindexer = harness.reindexer(harness.indexer(), RebuildConfig::default());
    let outcome = reindexer
        .rebuild_database_search_indices(&["Invoice", "Task"], None)
        .unwrap();

    assert_eq!(
        outcome,
        RebuildOutcome::Completed {
            summary: "Invoice, Task, ".to_string(),
            reports: vec![
                TypeReport {
                    entity_type: "Invoice".to_string(),
                    outcome: TypeOutcome::Indexed(4),
                },
                TypeReport {
                    entity_type: "Task".to_string(),
                    outcome: TypeOutcome::Indexed(2),
                },
            ],
        }
    );
    assert_eq!(outcome.to_string(), "Invoice, Task, ");
    assert_eq!(harness.doc_count("Invoice"), 4);
    assert_eq!(harness.doc_count("Task"), 2);
    assert_eq!(harness.doc_count("HistoryRecord"), 0);
}

#[test]
fn test_from_date_selects_newer_rows_only() {
    let harness = TestHarness::new();
    seed(&harness);

    let reindexer = harness.reindexer(harness.indexer(), RebuildConfig::default());
    let outcome = reindexer
        .rebuild_database_search_indices(&["Invoice"], Some(&ReindexSettings::since(base_time())))
        .unwrap();

    assert_eq!(outcome.rows_indexed(), 2);
    assert_eq!(harness.doc_count("Invoice"), 2);
}

#[test]
fn test_from_date_on_history_falls_back_to_full_scan() {
    let harness = TestHarness::new();
    seed(&harness);

    let reindexer = harness.reindexer(harness.indexer(), RebuildConfig::default());
    let since = reindexer
        .rebuild_database_search_indices(
            &["HistoryRecord"],
            Some(&ReindexSettings::since(base_time())),
        )
        .unwrap();
    let full = reindexer
        .rebuild_database_search_indices(&["HistoryRecord"], None)
        .unwrap();

    assert_eq!(since.rows_indexed(), 3);
    assert_eq!(since.rows_indexed(), full.rows_indexed());
    assert_eq!(harness.doc_count("HistoryRecord"), 3);
}

#[test]
fn test_last_n_takes_highest_order_keys() {
    let harness = TestHarness::new();
    seed(&harness);

    let sink = Arc::new(RecordingSink {
        inner: harness.indexer(),
        ids: Mutex::new(Vec::new()),
    });
    let reindexer = harness.reindexer(sink.clone(), RebuildConfig::default());

    reindexer
        .rebuild_database_search_indices(&["Invoice"], Some(&ReindexSettings::last(2)))
        .unwrap();
    reindexer
        .rebuild_database_search_indices(&["HistoryRecord"], Some(&ReindexSettings::last(2)))
        .unwrap();

    assert_eq!(*sink.ids.lock().unwrap(), vec![4, 3, 12, 11]);
    assert_eq!(harness.doc_count("Invoice"), 2);
}

#[test]
fn test_rebuild_full_indexes_only_the_type() {
    let harness = TestHarness::new();
    seed(&harness);

    let reindexer = harness.reindexer(harness.indexer(), RebuildConfig::default());
    let outcome = reindexer.rebuild_full("Task").unwrap();

    assert_eq!(outcome.to_string(), "Task, ");
    assert_eq!(harness.doc_count("Task"), 2);
    assert_eq!(harness.doc_count("HistoryRecord"), 0);
}

#[test]
fn test_rebuild_newest_indexes_history() {
    let harness = TestHarness::new();
    seed(&harness);

    let reindexer = harness.reindexer(harness.indexer(), RebuildConfig::default());
    let outcome = reindexer.rebuild_newest_entries(&["Invoice", "Task"]).unwrap();

    // Seeded rows predate yesterday; history has no modification field.
    assert_eq!(outcome.to_string(), "Invoice, Task, HistoryRecord, ");
    assert_eq!(harness.doc_count("Invoice"), 0);
    assert_eq!(harness.doc_count("Task"), 0);
    assert_eq!(harness.doc_count("HistoryRecord"), 3);
}

#[test]
fn test_batches_flush_every_batch_size_rows() {
    let harness = TestHarness::new();
    let rows: Vec<EntityRow> = (1..=2500).map(|id| task(id, 0)).collect();
    harness.put_rows(&rows);

    let sink = Arc::new(CountingSink::new(harness.indexer()));
    let reindexer = harness.reindexer(
        sink.clone(),
        RebuildConfig::default().with_batch_size(1000),
    );
    let outcome = reindexer
        .rebuild_database_search_indices(&["Task"], None)
        .unwrap();

    assert_eq!(outcome.rows_indexed(), 2500);
    assert_eq!(sink.flush_count(), 3);
    assert_eq!(sink.optimize_count(), 1);
    assert_eq!(harness.doc_count("Task"), 2500);
}

#[test]
fn test_reindex_replaces_documents() {
    let harness = TestHarness::new();
    seed(&harness);

    let reindexer = harness.reindexer(harness.indexer(), RebuildConfig::default());
    reindexer
        .rebuild_database_search_indices(&["Invoice"], None)
        .unwrap();
    reindexer
        .rebuild_database_search_indices(&["Invoice"], None)
        .unwrap();

    assert_eq!(harness.doc_count("Invoice"), 4);
    assert_eq!(harness.searcher().num_docs(), 4);
}

#[test]
fn test_checkpoints_record_each_pass() {
    let harness = TestHarness::new();
    seed(&harness);

    let reindexer = harness.reindexer(harness.indexer(), RebuildConfig::default());
    reindexer
        .rebuild_database_search_indices(&["Invoice"], None)
        .unwrap();
    reindexer
        .rebuild_database_search_indices(&["Task"], Some(&ReindexSettings::last(1)))
        .unwrap();

    let invoice = harness.storage.load("Invoice").unwrap().unwrap();
    assert_eq!(invoice.rows_indexed, 4);
    assert!(!invoice.partial);

    let task = harness.storage.load("Task").unwrap().unwrap();
    assert_eq!(task.rows_indexed, 1);
    assert!(task.partial);

    assert_eq!(harness.storage.list().unwrap().len(), 2);
    assert!(harness.storage.load("HistoryRecord").unwrap().is_none());
}
