//! Task error types.
//!
//! Validation and not-found failures are raised by this crate; storage
//! failures wrap the underlying `SQLite` or pool error unchanged.

use thiserror::Error;

/// Errors from task model and store operations.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task failed validation and was not written.
    #[error("validation error: {0}")]
    Validation(String),

    /// No task row matched the requested ID.
    #[error("no task found with id {id}")]
    NotFound {
        /// The ID that was looked up.
        id: i64,
    },

    /// A date phrase could not be interpreted.
    #[error("invalid date format: {0}")]
    DateParse(String),

    /// Database operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// No connection could be checked out of the pool.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Filesystem error while preparing the database location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskError {
    /// Create a not-found error for a task ID.
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    /// Whether this error reports a missing task.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error originates from the storage layer.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Pool(_) | Self::Io(_))
    }
}

/// Convenience result alias for task operations.
pub type Result<T> = std::result::Result<T, TaskError>;
