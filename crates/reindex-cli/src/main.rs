//! ProjectForge search-index rebuild.
//!
//! # Usage
//!
//! ```bash
//! reindex rebuild --type Invoice --type Task [--from-date 2024-01-01 | --last N | --newest]
//! reindex load --file rows.jsonl
//! reindex status
//! reindex compact
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/projectforge-reindex/config.toml)
//! 3. `--config` file
//! 4. Environment variables (REINDEX_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use reindex_cli::{run, Cli};

fn main() -> Result<()> {
    run(Cli::parse())
}
