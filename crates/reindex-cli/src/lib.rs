//! Reindex CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (rebuild, load, status, compact)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    compact, init_logging, load_rows, load_settings, parse_from_date, rebuild_scope, run,
    run_rebuild, status_report, RebuildScope,
};
