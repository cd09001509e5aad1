//! Event store error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while opening or using the event store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open event store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt row {id}: {reason}")]
    Corrupt { id: i64, reason: String },

    #[error("Event store lock poisoned")]
    Poisoned,
}
