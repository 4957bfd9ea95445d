//! CLI argument parsing for the reindex tool.
//!
//! CLI flags override all other config sources.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Search-index rebuild for the ProjectForge row store
#[derive(Parser, Debug)]
#[command(name = "reindex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/projectforge-reindex/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override row store path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Override search index path
    #[arg(long, global = true)]
    pub index_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the search index for one or more entity types
    Rebuild {
        /// Entity type to reindex, in order (repeatable)
        #[arg(short = 't', long = "type", required = true)]
        types: Vec<String>,

        /// Only rows modified after this date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        from_date: Option<String>,

        /// Only the N rows with the highest order key
        #[arg(long)]
        last: Option<usize>,

        /// Rows modified since yesterday, 1,000 newest at most
        #[arg(long, conflicts_with_all = ["from_date", "last"])]
        newest: bool,
    },

    /// Import rows from a JSON lines file
    Load {
        /// File with one JSON object per line, each with an `entityType` field
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show row counts, index document counts and reindex checkpoints
    Status,

    /// Trigger RocksDB compaction
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_rebuild_types_in_order() {
        let cli = Cli::parse_from(["reindex", "rebuild", "--type", "Invoice", "-t", "Task"]);
        match cli.command {
            Commands::Rebuild { types, newest, .. } => {
                assert_eq!(types, vec!["Invoice", "Task"]);
                assert!(!newest);
            }
            _ => panic!("Expected Rebuild command"),
        }
    }

    #[test]
    fn test_cli_rebuild_requires_type() {
        assert!(Cli::try_parse_from(["reindex", "rebuild"]).is_err());
    }

    #[test]
    fn test_cli_rebuild_scopes() {
        let cli = Cli::parse_from([
            "reindex", "rebuild", "--type", "Task", "--from-date", "2024-01-01", "--last", "50",
        ]);
        match cli.command {
            Commands::Rebuild {
                from_date, last, ..
            } => {
                assert_eq!(from_date.as_deref(), Some("2024-01-01"));
                assert_eq!(last, Some(50));
            }
            _ => panic!("Expected Rebuild command"),
        }
    }

    #[test]
    fn test_cli_newest_conflicts_with_last() {
        let result =
            Cli::try_parse_from(["reindex", "rebuild", "--type", "Task", "--newest", "--last", "5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_load() {
        let cli = Cli::parse_from(["reindex", "load", "--file", "rows.jsonl"]);
        match cli.command {
            Commands::Load { file } => assert_eq!(file, PathBuf::from("rows.jsonl")),
            _ => panic!("Expected Load command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "reindex",
            "status",
            "--config",
            "/etc/reindex.toml",
            "--log-level",
            "debug",
            "--db-path",
            "/data/db",
            "--index-path",
            "/data/index",
        ]);
        assert!(matches!(cli.command, Commands::Status));
        assert_eq!(cli.config.as_deref(), Some("/etc/reindex.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.db_path.as_deref(), Some("/data/db"));
        assert_eq!(cli.index_path.as_deref(), Some("/data/index"));
    }

    #[test]
    fn test_cli_compact() {
        let cli = Cli::parse_from(["reindex", "compact"]);
        assert!(matches!(cli.command, Commands::Compact));
    }
}
