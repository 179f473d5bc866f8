//! Common error types for Sentinel-Ops

use thiserror::Error;

/// Common result type for Sentinel-Ops operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across Sentinel-Ops crates
///
/// Validation failures are not represented here: a failed validation is a
/// recorded outcome carried in [`crate::ValidationResult::reasons`].
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not allowed in the entity's current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Projection was asked to fold zero events
    #[error("cannot reconstruct state from empty event stream")]
    EmptyEventStream,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
