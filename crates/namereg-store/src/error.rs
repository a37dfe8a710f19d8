//! Error types for the store module.

use namereg_core::{CoreError, NameKey};
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A live record already holds the key.
    #[error("name {0} is already registered")]
    NameTaken(NameKey),

    /// No live (or, for renewal, renewable) record for the key.
    #[error("no live record for {0}")]
    NotFound(NameKey),

    /// The caller does not own the record.
    #[error("caller does not own {0}")]
    Unauthorized(NameKey),

    /// A lease computation was rejected (zero or out-of-range duration,
    /// or a renewal that would not reach past `now`).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Invalid data in storage, or data that cannot be stored.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(String),

    /// A blocking task failed to complete.
    #[error("blocking task failed: {0}")]
    Task(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
