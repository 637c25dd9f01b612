//! Journal store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in journal store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("remote store error: {0}")]
    Remote(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] daybook_crypto::CryptoError),

    #[error("legacy store I/O error: {0}")]
    Io(#[from] std::io::Error),
}
