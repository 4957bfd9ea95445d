//! Forward-only, read-only row cursor.
//!
//! The cursor walks one table's key range with a raw RocksDB iterator and
//! decodes at most `fetch_size` matching rows per refill, so a scan over a
//! large table never materializes the whole result set. Reads bypass the
//! block cache to keep a full scan from evicting hot data.

use std::collections::VecDeque;

use rocksdb::{DBRawIteratorWithThreadMode, ReadOptions, DB};
use tracing::trace;

use reindex_types::{EntityRow, RowFilter, RowQuery};

use crate::error::StorageError;
use crate::keys::RowKey;

/// Average encoded row size used to size iterator readahead
const ROW_SIZE_HINT: usize = 512;

/// Cursor over the rows matching a [`RowQuery`].
pub struct RowCursor<'a> {
    iter: DBRawIteratorWithThreadMode<'a, DB>,
    query: RowQuery,
    prefix: Vec<u8>,
    descending: bool,
    fetch_size: usize,
    buffer: VecDeque<EntityRow>,
    matched: usize,
    exhausted: bool,
}

impl<'a> RowCursor<'a> {
    pub(crate) fn open(
        db: &'a DB,
        cf: &rocksdb::ColumnFamily,
        query: &RowQuery,
        fetch_size: usize,
    ) -> Result<Self, StorageError> {
        let fetch_size = fetch_size.max(1);

        let mut read_opts = ReadOptions::default();
        read_opts.fill_cache(false);
        read_opts.set_readahead_size(fetch_size * ROW_SIZE_HINT);

        let mut iter = db.raw_iterator_cf_opt(cf, read_opts);

        // Rows are keyed by their order key, so any ordering follows the key.
        let descending = query.order.as_ref().is_some_and(|o| o.descending);
        let prefix = RowKey::table_prefix(&query.entity_type);
        if descending {
            iter.seek_for_prev(RowKey::table_upper_bound(&query.entity_type));
        } else {
            iter.seek(&prefix);
        }
        iter.status()?;

        Ok(Self {
            iter,
            query: query.clone(),
            prefix,
            descending,
            fetch_size,
            buffer: VecDeque::with_capacity(fetch_size),
            matched: 0,
            exhausted: false,
        })
    }

    /// Next matching row, or `None` once the cursor is exhausted.
    pub fn next_row(&mut self) -> Result<Option<EntityRow>, StorageError> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fill()?;
        }
        Ok(self.buffer.pop_front())
    }

    /// Number of rows decoded so far.
    pub fn matched(&self) -> usize {
        self.matched
    }

    fn limit_reached(&self) -> bool {
        self.query.limit.is_some_and(|limit| self.matched >= limit)
    }

    /// Decode up to `fetch_size` matching rows into the buffer.
    fn fill(&mut self) -> Result<(), StorageError> {
        while self.buffer.len() < self.fetch_size {
            if self.limit_reached() || !self.iter.valid() {
                self.exhausted = true;
                break;
            }
            let (key, value) = match (self.iter.key(), self.iter.value()) {
                (Some(key), Some(value)) => (key, value),
                _ => {
                    self.exhausted = true;
                    break;
                }
            };
            if !key.starts_with(&self.prefix) {
                self.exhausted = true;
                break;
            }

            let row = EntityRow::from_bytes(value)?;
            if matches_filter(&row, self.query.filter.as_ref()) {
                self.matched += 1;
                self.buffer.push_back(row);
            }

            if self.descending {
                self.iter.prev();
            } else {
                self.iter.next();
            }
        }
        self.iter.status()?;

        trace!(
            entity = %self.query.entity_type,
            buffered = self.buffer.len(),
            matched = self.matched,
            "Cursor refill"
        );
        Ok(())
    }
}

/// Whether a row passes a filter. Rows missing the filtered field never match.
pub(crate) fn matches_filter(row: &EntityRow, filter: Option<&RowFilter>) -> bool {
    match filter {
        None => true,
        Some(RowFilter::ModifiedAfter { field, after }) => {
            row.timestamp(field).is_some_and(|at| at > *after)
        }
    }
}
