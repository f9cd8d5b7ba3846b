//! Common error types for DevTasks.

use thiserror::Error;

/// Top-level error type for DevTasks operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Local persistence read or write failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Network transport failed or the remote returned a non-success status.
    #[error("Network error: {0}")]
    Network(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
