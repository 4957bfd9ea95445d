//! Column family definitions for RocksDB.
//!
//! - rows: entity rows of all tables, keyed `row:{entity_type}:{id}`
//! - checkpoints: per-type reindex checkpoints

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for entity rows
pub const CF_ROWS: &str = "rows";

/// Column family name for reindex checkpoints
pub const CF_CHECKPOINTS: &str = "checkpoints";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_ROWS, CF_CHECKPOINTS];

/// Rows are scanned far more often than written
fn rows_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_ROWS, rows_options()),
        ColumnFamilyDescriptor::new(CF_CHECKPOINTS, Options::default()),
    ]
}
