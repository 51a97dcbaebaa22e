//! Error types for MediFlow.

use crate::dispatch::model::QueueKind;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Dispatch-run errors.
///
/// A run either completes with a full assignment batch or aborts whole;
/// partially computed assignments are never surfaced. Malformed request
/// timestamps are not represented here — they skip the affected task and
/// the run continues.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{queue} snapshot unavailable: {source}")]
    SourceUnavailable {
        queue: QueueKind,
        source: DatabaseError,
    },

    #[error("{queue} assignment commit failed: {source}")]
    CommitFailed {
        queue: QueueKind,
        source: DatabaseError,
    },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
