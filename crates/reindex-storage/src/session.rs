//! Read session over the row store.
//!
//! A session owns at most one open cursor and an identity cache of the rows
//! it has handed out. Long scans call [`StorageSession::clear`] periodically
//! to drop that cache; the open cursor survives a clear.

use std::collections::HashMap;

use tracing::debug;

use reindex_types::{EntityRow, RowQuery};

use crate::cursor::RowCursor;
use crate::db::Storage;
use crate::error::StorageError;

/// A read session bound to a [`Storage`].
pub struct StorageSession<'a> {
    storage: &'a Storage,
    cursor: Option<RowCursor<'a>>,
    cache: HashMap<(String, u64), EntityRow>,
    open: bool,
}

impl<'a> StorageSession<'a> {
    pub(crate) fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            cursor: None,
            cache: HashMap::new(),
            open: true,
        }
    }

    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.open {
            Ok(())
        } else {
            Err(StorageError::SessionClosed)
        }
    }

    /// Count the rows matching `query`.
    pub fn count(&mut self, query: &RowQuery) -> Result<u64, StorageError> {
        self.ensure_open()?;
        self.storage.count(query)
    }

    /// Open a cursor for `query`, replacing any previous cursor.
    pub fn scroll(&mut self, query: &RowQuery, fetch_size: usize) -> Result<(), StorageError> {
        self.ensure_open()?;
        self.cursor = Some(self.storage.scan(query, fetch_size)?);
        Ok(())
    }

    /// Next row of the open cursor.
    pub fn next_row(&mut self) -> Result<Option<EntityRow>, StorageError> {
        self.ensure_open()?;
        let cursor = self.cursor.as_mut().ok_or(StorageError::NoCursor)?;
        let row = cursor.next_row()?;
        if let Some(row) = &row {
            self.cache
                .insert((row.entity_type.clone(), row.id), row.clone());
        }
        Ok(row)
    }

    /// Drop all cached rows.
    pub fn clear(&mut self) {
        if !self.cache.is_empty() {
            debug!(cached = self.cache.len(), "Clearing session cache");
        }
        self.cache.clear();
    }

    #[cfg(test)]
    fn cached_rows(&self) -> usize {
        self.cache.len()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Close the session, releasing the cursor and cache. Idempotent.
    pub fn close(&mut self) {
        if self.open {
            self.cursor = None;
            self.cache.clear();
            self.open = false;
            debug!("Session closed");
        }
    }
}
