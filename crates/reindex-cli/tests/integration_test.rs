//! Integration tests for the reindex commands against real RocksDB and
//! Tantivy directories.

use std::fs;
use std::path::Path;

use chrono::Utc;
use tempfile::TempDir;

use reindex_cli::{load_rows, rebuild_scope, run_rebuild, status_report, RebuildScope};
use reindex_core::{RebuildOutcome, TypeOutcome, TypeReport};
use reindex_search::{IndexSearcher, SearchIndex, SearchIndexConfig};
use reindex_types::Settings;

fn settings_in(dir: &Path) -> Settings {
    Settings {
        db_path: dir.join("db").to_string_lossy().to_string(),
        search_index_path: dir.join("search-index").to_string_lossy().to_string(),
        batch_size: 2,
        ..Settings::default()
    }
}

fn write_rows(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("rows.jsonl");
    let lines = [
        r#"{"entityType": "Invoice", "id": 1, "subject": "Hosting", "lastUpdate": "2023-11-02T09:00:00Z"}"#,
        r#"{"entityType": "Invoice", "id": 2, "subject": "Consulting", "lastUpdate": "2024-02-10T09:00:00Z"}"#,
        "",
        r#"{"entityType": "Invoice", "id": 3, "subject": "Licenses", "lastUpdate": "2024-03-01T09:00:00Z"}"#,
        r#"{"entityType": "Task", "id": 7, "title": "Release 8.0", "lastUpdate": "2024-01-15T12:00:00Z"}"#,
        r#"{"entityType": "HistoryRecord", "pk": 100, "entityName": "Invoice", "entityId": 2}"#,
    ];
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

#[test]
fn test_load_then_full_rebuild() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let file = write_rows(temp_dir.path());

    assert_eq!(load_rows(&settings, &file).unwrap(), 5);

    let types = vec!["Invoice".to_string(), "Task".to_string()];
    let outcome = run_rebuild(&settings, &types, &RebuildScope::Types(None)).unwrap();
    match &outcome {
        RebuildOutcome::Completed { summary, .. } => assert_eq!(summary, "Invoice, Task, "),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(outcome.rows_indexed(), 4);

    let report = status_report(&settings).unwrap();
    assert!(report.contains("Rows: 5"));
    assert!(report.contains("Documents: 4"));
    assert!(report.contains("Checkpoints: 2"));
}

#[test]
fn test_rebuild_from_date() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let file = write_rows(temp_dir.path());
    load_rows(&settings, &file).unwrap();

    let scope = rebuild_scope(Some("2024-01-01"), None, false).unwrap();
    let types = vec!["Invoice".to_string()];
    let outcome = run_rebuild(&settings, &types, &scope).unwrap();

    assert_eq!(outcome.rows_indexed(), 2);
    assert!(status_report(&settings).unwrap().contains("(partial)"));
}

#[test]
fn test_unknown_type_fails_the_job() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());

    let types = vec!["Nonexistent".to_string()];
    assert!(run_rebuild(&settings, &types, &RebuildScope::Types(None)).is_err());
}

#[test]
fn test_load_reports_bad_line() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let path = temp_dir.path().join("bad.jsonl");
    fs::write(
        &path,
        "{\"entityType\": \"Task\", \"id\": 1}\n{\"entityType\": \"Task\"}\n",
    )
    .unwrap();

    let err = load_rows(&settings, &path).unwrap_err();
    assert!(format!("{:#}", err).contains("Line 2"));
}

fn write_recent_rows(dir: &Path) -> std::path::PathBuf {
    let now = Utc::now().to_rfc3339();
    let path = dir.join("recent.jsonl");
    let fresh = format!(
        r#"{{"entityType": "Task", "id": 2, "title": "Fresh", "lastUpdate": "{}"}}"#,
        now
    );
    let lines = [
        r#"{"entityType": "Task", "id": 1, "title": "Old", "lastUpdate": "2020-01-01T00:00:00Z"}"#,
        fresh.as_str(),
        r#"{"entityType": "HistoryRecord", "pk": 50, "entityName": "Task", "entityId": 2}"#,
        r#"{"entityType": "HistoryRecord", "pk": 51, "entityName": "Task", "entityId": 1}"#,
    ];
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn doc_count(settings: &Settings, entity_type: &str) -> u64 {
    let index = SearchIndex::open_or_create(SearchIndexConfig::from_settings(settings)).unwrap();
    IndexSearcher::new(&index)
        .unwrap()
        .count_type(entity_type)
        .unwrap()
}

#[test]
fn test_newest_rebuild_includes_history() {
    let temp_dir = TempDir::new().unwrap();
    let settings = settings_in(temp_dir.path());
    let file = write_recent_rows(temp_dir.path());
    load_rows(&settings, &file).unwrap();

    let scope = rebuild_scope(None, None, true).unwrap();
    let types = vec!["Task".to_string()];
    let outcome = run_rebuild(&settings, &types, &scope).unwrap();

    assert_eq!(outcome.to_string(), "Task, HistoryRecord, ");
    match &outcome {
        RebuildOutcome::Completed { reports, .. } => assert_eq!(
            reports,
            &vec![
                TypeReport {
                    entity_type: "Task".to_string(),
                    outcome: TypeOutcome::Indexed(1),
                },
                TypeReport {
                    entity_type: "HistoryRecord".to_string(),
                    outcome: TypeOutcome::Indexed(2),
                },
            ]
        ),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(doc_count(&settings, "Task"), 1);
    assert_eq!(doc_count(&settings, "HistoryRecord"), 2);
}

#[test]
fn test_newest_rebuild_without_history_type() {
    let temp_dir = TempDir::new().unwrap();
    let settings = Settings {
        history_entity_type: None,
        ..settings_in(temp_dir.path())
    };
    let file = write_recent_rows(temp_dir.path());
    load_rows(&settings, &file).unwrap();

    let types = vec!["Task".to_string()];
    let outcome = run_rebuild(&settings, &types, &RebuildScope::Newest).unwrap();

    assert_eq!(outcome.to_string(), "Task, ");
    assert_eq!(doc_count(&settings, "HistoryRecord"), 0);
}
