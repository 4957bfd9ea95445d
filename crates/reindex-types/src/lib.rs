//! # reindex-types
//!
//! Shared domain types for the search-index rebuild pipeline.
//!
//! - [`EntityRow`]: a row of an entity table as stored in the row store
//! - [`RowQuery`]: a scoped query over one entity table
//! - [`ReindexSettings`]: full vs. incremental reindex request
//! - [`Settings`]: application configuration

pub mod config;
pub mod error;
pub mod query;
pub mod request;
pub mod row;

pub use config::Settings;
pub use error::ReindexError;
pub use query::{OrderBy, Projection, RowFilter, RowQuery};
pub use request::{ReindexSettings, NEWEST_ENTRIES_LIMIT};
pub use row::EntityRow;
