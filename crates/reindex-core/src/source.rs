//! Row source collaborator: sessions that count and scroll rows.

use std::ops::{Deref, DerefMut};

use reindex_storage::{Storage, StorageSession};
use reindex_types::{EntityRow, RowQuery};

use crate::error::IndexingError;

/// A read session over a row source.
///
/// A session holds at most one forward-only cursor, opened by `scroll`.
pub trait RowSession {
    /// Number of rows the query matches.
    fn count(&mut self, query: &RowQuery) -> Result<u64, IndexingError>;

    /// Open a read-only, forward-only cursor reading `fetch_size` rows at a time.
    fn scroll(&mut self, query: &RowQuery, fetch_size: usize) -> Result<(), IndexingError>;

    /// Next row of the cursor, `None` when exhausted.
    fn next_row(&mut self) -> Result<Option<EntityRow>, IndexingError>;

    /// Drop rows the session keeps for identity; the cursor stays open.
    fn clear(&mut self);

    fn is_open(&self) -> bool;

    fn close(&mut self);
}

/// Opens sessions on the row store.
pub trait RowSource: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn RowSession + '_>, IndexingError>;
}

/// Closes the wrapped session when dropped, on success and on failure.
pub struct SessionGuard<'a> {
    session: Box<dyn RowSession + 'a>,
}

impl<'a> SessionGuard<'a> {
    pub fn new(session: Box<dyn RowSession + 'a>) -> Self {
        Self { session }
    }
}

impl<'a> Deref for SessionGuard<'a> {
    type Target = dyn RowSession + 'a;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl<'a> DerefMut for SessionGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if self.session.is_open() {
            self.session.close();
        }
    }
}

impl RowSession for StorageSession<'_> {
    fn count(&mut self, query: &RowQuery) -> Result<u64, IndexingError> {
        Ok(StorageSession::count(self, query)?)
    }

    fn scroll(&mut self, query: &RowQuery, fetch_size: usize) -> Result<(), IndexingError> {
        Ok(StorageSession::scroll(self, query, fetch_size)?)
    }

    fn next_row(&mut self) -> Result<Option<EntityRow>, IndexingError> {
        Ok(StorageSession::next_row(self)?)
    }

    fn clear(&mut self) {
        StorageSession::clear(self)
    }

    fn is_open(&self) -> bool {
        StorageSession::is_open(self)
    }

    fn close(&mut self) {
        StorageSession::close(self)
    }
}

impl RowSource for Storage {
    fn open_session(&self) -> Result<Box<dyn RowSession + '_>, IndexingError> {
        Ok(Box::new(self.session()))
    }
}
