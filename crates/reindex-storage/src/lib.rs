//! Row store for the search-index rebuild.
//!
//! Provides RocksDB-backed storage with:
//! - One key range per entity table, ordered by the row's order key
//! - Atomic batch loads via WriteBatch
//! - Forward-only cursors that read rows in bounded batches
//! - Sessions with a clearable row cache
//! - Checkpoints recording the last reindex run per entity type

pub mod column_families;
pub mod cursor;
pub mod db;
pub mod error;
pub mod keys;
pub mod session;

pub use cursor::RowCursor;
pub use db::{Storage, StorageStats};
pub use error::StorageError;
pub use keys::{CheckpointKey, RowKey};
pub use session::StorageSession;
