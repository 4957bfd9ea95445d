//! RocksDB wrapper for the entity row store.
//!
//! Provides:
//! - Database open with column family setup
//! - Batched row writes
//! - Query evaluation: counting and forward-only cursors
//! - Checkpoint storage for reindex runs

use std::collections::BTreeMap;
use std::path::Path;

use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use tracing::{debug, info};

use reindex_types::{EntityRow, RowQuery};

use crate::column_families::{build_cf_descriptors, ALL_CF_NAMES, CF_CHECKPOINTS, CF_ROWS};
use crate::cursor::{matches_filter, RowCursor};
use crate::error::StorageError;
use crate::keys::{CheckpointKey, RowKey};
use crate::session::StorageSession;

/// Main storage interface for entity rows
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    /// Open a session for counting and scrolling.
    pub fn session(&self) -> StorageSession<'_> {
        StorageSession::new(self)
    }

    // ==================== Row Methods ====================

    /// Store many rows in one atomic write.
    pub fn put_rows(&self, rows: &[EntityRow]) -> Result<usize, StorageError> {
        let cf = self.cf(CF_ROWS)?;
        let mut batch = WriteBatch::default();
        for row in rows {
            let key = RowKey::new(row.entity_type.clone(), row.id)?;
            batch.put_cf(cf, key.to_bytes(), row.to_bytes()?);
        }
        self.db.write(batch)?;
        debug!(count = rows.len(), "Stored rows batch");
        Ok(rows.len())
    }

    // ==================== Query Methods ====================

    /// Number of rows a query would return (`select count(*)` semantics,
    /// capped by the query's limit).
    pub fn count(&self, query: &RowQuery) -> Result<u64, StorageError> {
        let cf = self.cf(CF_ROWS)?;
        let prefix = RowKey::table_prefix(&query.entity_type);
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut count = 0u64;
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            if query.filter.is_some() {
                let row = EntityRow::from_bytes(&value)?;
                if !matches_filter(&row, query.filter.as_ref()) {
                    continue;
                }
            }
            count += 1;
        }

        if let Some(limit) = query.limit {
            count = count.min(limit as u64);
        }
        debug!(query = %query, count, "Counted rows");
        Ok(count)
    }

    /// Open a forward-only cursor over the rows matching `query`.
    pub fn scan(&self, query: &RowQuery, fetch_size: usize) -> Result<RowCursor<'_>, StorageError> {
        let cf = self.cf(CF_ROWS)?;
        debug!(query = %query, fetch_size, "Opening row cursor");
        RowCursor::open(&self.db, cf, query, fetch_size)
    }

    /// Row count per entity type.
    pub fn row_counts(&self) -> Result<BTreeMap<String, u64>, StorageError> {
        let cf = self.cf(CF_ROWS)?;
        let mut counts = BTreeMap::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item?;
            let row_key = RowKey::from_bytes(&key)?;
            *counts.entry(row_key.entity_type).or_insert(0) += 1;
        }
        Ok(counts)
    }

    // ==================== Checkpoint Methods ====================

    /// Store a checkpoint
    pub fn put_checkpoint(&self, name: &str, checkpoint_bytes: &[u8]) -> Result<(), StorageError> {
        let cf = self.cf(CF_CHECKPOINTS)?;
        let key = CheckpointKey::new(name);
        self.db.put_cf(cf, key.to_bytes(), checkpoint_bytes)?;
        Ok(())
    }

    /// Get a checkpoint
    pub fn get_checkpoint(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let cf = self.cf(CF_CHECKPOINTS)?;
        let key = CheckpointKey::new(name);
        Ok(self.db.get_cf(cf, key.to_bytes())?)
    }

    /// All checkpoints as (name, bytes), ordered by name.
    pub fn list_checkpoints(&self) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        let cf = self.cf(CF_CHECKPOINTS)?;
        let prefix = CheckpointKey::prefix();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        let mut results = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            let name = String::from_utf8_lossy(&key[prefix.len()..]).to_string();
            results.push((name, value.to_vec()));
        }
        Ok(results)
    }

    // ===== Admin Operations =====

    /// Flush all column families to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        for cf_name in ALL_CF_NAMES {
            if let Some(cf) = self.db.cf_handle(cf_name) {
                self.db.flush_cf(cf)?;
            }
        }
        Ok(())
    }

    /// Trigger manual compaction on all column families.
    pub fn compact(&self) -> Result<(), StorageError> {
        info!("Starting full compaction...");
        for cf_name in ALL_CF_NAMES {
            if let Some(cf) = self.db.cf_handle(cf_name) {
                self.db.compact_range_cf::<&[u8], &[u8]>(cf, None, None);
            }
        }
        info!("Compaction complete");
        Ok(())
    }

    /// Get database statistics.
    pub fn get_stats(&self) -> Result<StorageStats, StorageError> {
        let rows_by_type = self.row_counts()?;
        let row_count = rows_by_type.values().sum();
        let checkpoint_count = self.list_checkpoints()?.len() as u64;

        Ok(StorageStats {
            row_count,
            rows_by_type,
            checkpoint_count,
            disk_usage_bytes: self.get_disk_usage(),
        })
    }

    fn get_disk_usage(&self) -> u64 {
        let mut total_size = 0u64;
        if let Ok(entries) = std::fs::read_dir(self.db.path()) {
            for entry in entries.flatten() {
                if let Ok(metadata) = entry.metadata() {
                    total_size += metadata.len();
                }
            }
        }
        total_size
    }
}

/// Statistics about the storage.
#[derive(Debug, Default)]
pub struct StorageStats {
    /// Number of rows over all tables
    pub row_count: u64,
    /// Number of rows per entity type
    pub rows_by_type: BTreeMap<String, u64>,
    /// Number of stored reindex checkpoints
    pub checkpoint_count: u64,
    /// Total disk usage in bytes
    pub disk_usage_bytes: u64,
}
