//! Command implementations for the reindex tool.
//!
//! Handles:
//! - rebuild: run a reindex job over the requested entity types
//! - load: import rows from a JSON lines file into the row store
//! - status: row counts, index document counts and checkpoints
//! - compact: RocksDB compaction

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tracing::info;

use reindex_core::{CheckpointStore, EntityRegistry, RebuildConfig, RebuildOutcome, Reindexer};
use reindex_search::{IndexSearcher, SearchIndex, SearchIndexConfig, SearchIndexer};
use reindex_storage::Storage;
use reindex_types::{EntityRow, ReindexSettings, Settings};

use crate::cli::{Cli, Commands};

/// Rows written per batch by `load`
const LOAD_BATCH_SIZE: usize = 1000;

/// Field of an imported JSON object naming its entity type
const ENTITY_TYPE_FIELD: &str = "entityType";

/// Load configuration and apply CLI overrides (highest precedence).
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(db_path) = &cli.db_path {
        settings.db_path = db_path.clone();
    }
    if let Some(index_path) = &cli.index_path {
        settings.search_index_path = index_path.clone();
    }
    if let Some(log_level) = &cli.log_level {
        settings.log_level = log_level.clone();
    }
    Ok(settings)
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp.
pub fn parse_from_date(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// What a `rebuild` run reindexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildScope {
    /// The requested types, limited by the settings (`None`: everything)
    Types(Option<ReindexSettings>),
    /// Newest entries of the requested types and of the history type
    Newest,
}

/// Rebuild scope from the rebuild flags.
pub fn rebuild_scope(
    from_date: Option<&str>,
    last: Option<usize>,
    newest: bool,
) -> Result<RebuildScope> {
    if newest {
        return Ok(RebuildScope::Newest);
    }
    let settings = ReindexSettings {
        from_date: from_date.map(parse_from_date).transpose()?,
        last_n_entries: last,
    };
    Ok(RebuildScope::Types(settings.is_partial().then_some(settings)))
}

fn open_storage(settings: &Settings) -> Result<Arc<Storage>> {
    let db_path = settings.expanded_db_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    let storage = Storage::open(&db_path)
        .with_context(|| format!("Failed to open storage at {:?}", db_path))?;
    Ok(Arc::new(storage))
}

fn open_index(settings: &Settings) -> Result<SearchIndex> {
    SearchIndex::open_or_create(SearchIndexConfig::from_settings(settings))
        .context("Failed to open search index")
}

/// Run a reindex job over `types`.
pub fn run_rebuild(
    settings: &Settings,
    types: &[String],
    scope: &RebuildScope,
) -> Result<RebuildOutcome> {
    let storage = open_storage(settings)?;
    let index = open_index(settings)?;
    let indexer = Arc::new(SearchIndexer::new(&index).context("Failed to create index writer")?);

    let mut registry = EntityRegistry::with_defaults();
    registry.set_history_type(settings.history_entity_type.clone());

    let checkpoints: Arc<dyn CheckpointStore> = storage.clone();
    let reindexer = Reindexer::new(
        storage,
        indexer,
        registry,
        RebuildConfig::from_settings(settings),
    )
    .with_checkpoints(checkpoints);

    let outcome = match scope {
        RebuildScope::Types(limits) => {
            reindexer.rebuild_database_search_indices(types, limits.as_ref())
        }
        RebuildScope::Newest => reindexer.rebuild_newest_entries(types),
    }
    .context("Re-index job failed")?;
    Ok(outcome)
}

/// Import rows from a JSON lines file. Returns the number of rows stored.
pub fn load_rows(settings: &Settings, file: &Path) -> Result<usize> {
    let storage = open_storage(settings)?;
    let registry = EntityRegistry::with_defaults();
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Failed to open {:?}", file))?,
    );

    let mut batch = Vec::with_capacity(LOAD_BATCH_SIZE);
    let mut stored = 0;
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("Failed to read line {}", line_no))?;
        if line.trim().is_empty() {
            continue;
        }
        let row = parse_row(&line, &registry).with_context(|| format!("Line {}", line_no))?;
        batch.push(row);
        if batch.len() == LOAD_BATCH_SIZE {
            stored += storage.put_rows(&batch)?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        stored += storage.put_rows(&batch)?;
    }
    storage.flush()?;

    info!(rows = stored, file = ?file, "Rows loaded");
    Ok(stored)
}

/// Parse one imported JSON object into a row.
///
/// The id is taken from the type's order-key field, `id` for unregistered
/// types.
fn parse_row(line: &str, registry: &EntityRegistry) -> Result<EntityRow> {
    let mut fields = match serde_json::from_str::<Value>(line)? {
        Value::Object(fields) => fields,
        _ => bail!("Expected a JSON object"),
    };
    let entity_type = match fields.remove(ENTITY_TYPE_FIELD) {
        Some(Value::String(name)) if !name.is_empty() => name,
        _ => bail!("Missing string field '{}'", ENTITY_TYPE_FIELD),
    };
    let order_key = registry
        .get(&entity_type)
        .map(|d| d.order_key_field.as_str())
        .unwrap_or("id");
    Ok(EntityRow::from_object(entity_type, order_key, fields)?)
}

/// Render the status report.
pub fn status_report(settings: &Settings) -> Result<String> {
    let storage = open_storage(settings)?;
    let stats = storage.get_stats()?;
    let index = open_index(settings)?;
    let searcher = IndexSearcher::new(&index)?;

    let mut out = String::new();
    writeln!(out, "Row store: {}", settings.expanded_db_path().display())?;
    writeln!(out, "  Rows: {}", stats.row_count)?;
    for (entity_type, count) in &stats.rows_by_type {
        writeln!(
            out,
            "    {:<20} {:>10} rows {:>10} docs",
            entity_type,
            count,
            searcher.count_type(entity_type)?
        )?;
    }
    writeln!(out, "  Disk usage: {} bytes", stats.disk_usage_bytes)?;
    writeln!(out, "Search index: {}", index.path().display())?;
    writeln!(out, "  Documents: {}", searcher.num_docs())?;

    let checkpoints = storage.list()?;
    writeln!(out, "Checkpoints: {}", checkpoints.len())?;
    for checkpoint in checkpoints {
        writeln!(
            out,
            "    {:<20} {} {:>10} rows{}",
            checkpoint.entity_type,
            checkpoint.last_run.format("%Y-%m-%d %H:%M:%S"),
            checkpoint.rows_indexed,
            if checkpoint.partial { " (partial)" } else { "" }
        )?;
    }
    Ok(out)
}

/// Compact the row store.
pub fn compact(settings: &Settings) -> Result<()> {
    let storage = open_storage(settings)?;
    storage.compact()?;
    Ok(())
}

/// Execute a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Rebuild {
            types,
            from_date,
            last,
            newest,
        } => {
            let scope = rebuild_scope(from_date.as_deref(), last, newest)?;
            let outcome = run_rebuild(&settings, &types, &scope)?;
            println!("{}", outcome);
            if !outcome.failed_types().is_empty() {
                bail!("Failed entity types: {}", outcome.failed_types().join(", "));
            }
        }
        Commands::Load { file } => {
            let rows = load_rows(&settings, &file)?;
            println!("Loaded {} rows from {}", rows, file.display());
        }
        Commands::Status => {
            print!("{}", status_report(&settings)?);
        }
        Commands::Compact => {
            compact(&settings)?;
            println!("Compaction complete");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_from_date() {
        assert_eq!(
            parse_from_date("2024-01-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_from_date("2024-01-01T10:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap()
        );
        assert!(parse_from_date("01.01.2024").is_err());
    }

    #[test]
    fn test_rebuild_scopes() {
        assert_eq!(
            rebuild_scope(None, None, false).unwrap(),
            RebuildScope::Types(None)
        );
        assert_eq!(
            rebuild_scope(None, Some(10), false).unwrap(),
            RebuildScope::Types(Some(ReindexSettings::last(10)))
        );
        assert_eq!(
            rebuild_scope(Some("2024-01-01"), None, false).unwrap(),
            RebuildScope::Types(Some(ReindexSettings::since(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            )))
        );
        assert_eq!(rebuild_scope(None, None, true).unwrap(), RebuildScope::Newest);

        assert!(rebuild_scope(Some("yesterday"), None, false).is_err());
    }

    #[test]
    fn test_parse_row() {
        let registry = EntityRegistry::with_defaults();

        let row = parse_row(
            r#"{"entityType": "HistoryRecord", "pk": 12, "entityName": "Task"}"#,
            &registry,
        )
        .unwrap();
        assert_eq!(row.entity_type, "HistoryRecord");
        assert_eq!(row.id, 12);
        assert!(!row.fields.contains_key(ENTITY_TYPE_FIELD));

        let row = parse_row(r#"{"entityType": "Kunde", "id": 3}"#, &registry).unwrap();
        assert_eq!(row.id, 3);

        assert!(parse_row(r#"{"id": 3}"#, &registry).is_err());
        assert!(parse_row(r#"[1, 2]"#, &registry).is_err());
        assert!(parse_row(r#"{"entityType": "Task", "title": "no id"}"#, &registry).is_err());
    }
}
