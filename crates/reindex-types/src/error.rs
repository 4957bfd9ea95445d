//! Error types shared across the reindex crates.

use thiserror::Error;

/// Unified error type for domain-level operations.
#[derive(Debug, Error)]
pub enum ReindexError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Row does not carry a usable order key
    #[error("Invalid row: {0}")]
    InvalidRow(String),
}
