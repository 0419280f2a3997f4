//! Core error types for trailhead-core.
//!
//! The engine never swallows domain errors: everything except the remote
//! classifier fallback (absorbed into a neutral classification, see
//! [`crate::usage::classify`]) propagates to the caller as a typed failure.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for trailhead-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A referenced entity is absent or not owned by the caller.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A caller-supplied value failed validation.
    #[error("invalid value for '{field}': {message}")]
    InvalidInput { field: &'static str, message: String },

    /// A manual log write was attempted on a device-only metric.
    #[error("'{metric}' goals cannot be logged manually; values are synced from the device")]
    InvalidSource { metric: String },

    /// An invest exceeded the banked balance.
    #[error("insufficient banked steps: requested {requested}, available {available}")]
    InsufficientSteps { requested: u32, available: u32 },

    /// The remote classifier failed or timed out. Recovered locally by the
    /// classifier; surfaces only through the [`RemoteClassifier`] trait.
    ///
    /// [`RemoteClassifier`]: crate::usage::RemoteClassifier
    #[error("remote classifier unavailable: {0}")]
    ExternalUnavailable(String),

    /// Database-related errors
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
