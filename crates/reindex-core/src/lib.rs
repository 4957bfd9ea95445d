//! Search-index rebuild pipeline.
//!
//! Reads entity rows from a [`RowSource`], recalculates derived fields and
//! feeds them to an [`IndexSink`] in flushed batches, one entity type at a
//! time and one job at a time.
//!
//! ## Key Components
//!
//! - [`Reindexer`]: runs rebuild jobs over a list of entity types
//! - [`JobCoordinator`]: rejects a job while another one runs
//! - [`EntityRegistry`]: per-type modification field, order key and hooks
//! - [`build_query`]: turns [`ReindexSettings`](reindex_types::ReindexSettings) into a row query
//! - [`ProgressMonitor`]: periodic progress reports
//! - [`ReindexCheckpoint`]: last run per entity type
//!
//! ## Example
//!
//! ```ignore
//! use reindex_core::{EntityRegistry, RebuildConfig, Reindexer};
//!
//! let reindexer = Reindexer::new(storage, indexer, EntityRegistry::with_defaults(), RebuildConfig::default());
//! let outcome = reindexer.rebuild_database_search_indices(&["Invoice", "Task"], None)?;
//! println!("{}", outcome);
//! ```

pub mod checkpoint;
pub mod coordinator;
pub mod error;
pub mod progress;
pub mod query;
pub mod rebuild;
pub mod recalc;
pub mod registry;
pub mod sink;
pub mod source;

pub use checkpoint::{CheckpointStore, ReindexCheckpoint};
pub use coordinator::{JobCoordinator, JobGuard};
pub use error::IndexingError;
pub use progress::{
    LoggingProgressCallback, NoOpProgressCallback, ProgressCallback, ProgressCounters,
    ProgressMonitor,
};
pub use query::{build_count_query, build_query};
pub use rebuild::{RebuildConfig, RebuildOutcome, Reindexer, TypeOutcome, TypeReport};
pub use recalc::{InvoiceTotals, Recalculate};
pub use registry::{EntityDescriptor, EntityRegistry};
pub use sink::IndexSink;
pub use source::{RowSession, RowSource, SessionGuard};
