//! Error types for Snapaja.

use thiserror::Error;

/// Common error type for Snapaja.
#[derive(Error, Debug)]
pub enum SnapajaError {
    /// Metadata store error.
    ///
    /// Wraps errors from the key-value backend. Errors from sqlx are
    /// automatically converted.
    #[error("metadata store error: {0}")]
    Metadata(String),

    /// Blob storage error.
    #[error("blob storage error: {0}")]
    Blob(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for SnapajaError {
    fn from(e: sqlx::Error) -> Self {
        SnapajaError::Metadata(e.to_string())
    }
}

/// Result type alias for Snapaja operations.
pub type Result<T> = std::result::Result<T, SnapajaError>;
