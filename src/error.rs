//! Error types for Folio.

use thiserror::Error;

/// Common error type for Folio.
#[derive(Error, Debug)]
pub enum FolioError {
    /// Database error.
    ///
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error (bad credentials).
    #[error("authentication error: {0}")]
    Auth(String),

    /// Permission denied error.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Uniqueness or reference conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation not allowed in the resource's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Outbound mail error.
    #[error("mail error: {0}")]
    Mail(String),

    /// Hosted media service error.
    #[error("media error: {0}")]
    Media(String),

    /// OAuth provider error.
    #[error("oauth error: {0}")]
    OAuth(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for FolioError {
    fn from(e: sqlx::Error) -> Self {
        FolioError::Database(e.to_string())
    }
}

/// Result type alias for Folio operations.
pub type Result<T> = std::result::Result<T, FolioError>;
