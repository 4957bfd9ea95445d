//! Configuration loading for the reindexer.
//!
//! Layered config: defaults -> config file -> `--config` file -> env vars -> CLI flags.
//! Default config file: ~/.config/projectforge-reindex/config.toml

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ReindexError;

const APP_NAME: &str = "projectforge-reindex";

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the RocksDB row store
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Path to the Tantivy index directory
    #[serde(default = "default_search_index_path")]
    pub search_index_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Rows between index flushes; also the cursor fetch size
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Documents between progress log lines
    #[serde(default = "default_progress_log_every")]
    pub progress_log_every: u64,

    /// Memory budget for the index writer in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Keep going with the remaining entity types when one fails
    #[serde(default)]
    pub continue_on_error: bool,

    /// Entity type holding change history, reindexed along with the
    /// requested types by `rebuild --newest`
    #[serde(default = "default_history_entity_type")]
    pub history_entity_type: Option<String>,
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_db_path() -> String {
    default_data_dir().join("db").to_string_lossy().to_string()
}

fn default_search_index_path() -> String {
    default_data_dir()
        .join("search-index")
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_progress_log_every() -> u64 {
    10_000
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_history_entity_type() -> Option<String> {
    Some("HistoryRecord".to_string())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            search_index_path: default_search_index_path(),
            log_level: default_log_level(),
            batch_size: default_batch_size(),
            progress_log_every: default_progress_log_every(),
            writer_memory_mb: default_writer_memory_mb(),
            continue_on_error: false,
            history_entity_type: default_history_entity_type(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/projectforge-reindex/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (REINDEX_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ReindexError> {
        let config_dir = ProjectDirs::from("", "", APP_NAME)
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| ReindexError::Config(e.to_string()))?
            .set_default("search_index_path", default_search_index_path())
            .map_err(|e| ReindexError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| ReindexError::Config(e.to_string()))?
            .set_default("batch_size", default_batch_size() as i64)
            .map_err(|e| ReindexError::Config(e.to_string()))?
            .set_default("progress_log_every", default_progress_log_every() as i64)
            .map_err(|e| ReindexError::Config(e.to_string()))?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)
            .map_err(|e| ReindexError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // REINDEX_DB_PATH, REINDEX_BATCH_SIZE, REINDEX_CONTINUE_ON_ERROR, ...
        builder = builder.add_source(
            Environment::with_prefix("REINDEX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| ReindexError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| ReindexError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ReindexError> {
        if self.batch_size == 0 {
            return Err(ReindexError::Config("batch_size must be > 0".to_string()));
        }
        if self.progress_log_every == 0 {
            return Err(ReindexError::Config(
                "progress_log_every must be > 0".to_string(),
            ));
        }
        if self.writer_memory_mb == 0 {
            return Err(ReindexError::Config(
                "writer_memory_mb must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// db_path with a leading `~/` expanded
    pub fn expanded_db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }

    /// search_index_path with a leading `~/` expanded
    pub fn expanded_search_index_path(&self) -> PathBuf {
        expand_home(&self.search_index_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
