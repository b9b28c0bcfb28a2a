//! Error types for workpulse-core.
//!
//! One hierarchy covers the whole sweep: storage ports, push delivery,
//! coordinate parsing, configuration, and report persistence. The batch
//! orchestrator matches on these variants to decide what is recoverable
//! per worker and what aborts the run.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for workpulse-core.
#[derive(Error, Debug)]
pub enum SweepError {
    /// Record-store failures (reads and writes)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Push delivery failures
    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    /// Coordinate parsing failures
    #[error("Geo error: {0}")]
    Geo(#[from] GeoError),

    /// Configuration failures
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors (run-report artifact)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors (run-report artifact)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Record-store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Store migration failed: {0}")]
    MigrationFailed(String),

    /// Stored timestamp or date column could not be parsed
    #[error("Corrupt stored value in {column}: {value}")]
    CorruptValue { column: String, value: String },

    /// Database is locked by a concurrent invocation
    #[error("Store is locked")]
    Locked,
}

/// Push-gateway errors.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The HTTP request itself failed
    #[error("Push transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The gateway answered with a non-success status
    #[error("Push gateway rejected the send: status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// No destination to deliver to
    #[error("No push destination registered for recipient {0}")]
    NoDestination(i64),
}

/// Coordinate errors.
#[derive(Error, Debug)]
pub enum GeoError {
    /// Not a "lat,lng" pair
    #[error("Malformed coordinate string: '{0}'")]
    Malformed(String),

    /// A component was not a number
    #[error("Non-numeric coordinate component in '{0}'")]
    NonNumeric(String),

    /// Worker has no registered point for this check
    #[error("No registered {kind} point for worker {worker}")]
    MissingPoint { worker: i64, kind: &'static str },
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for SweepError
pub type Result<T, E = SweepError> = std::result::Result<T, E>;
