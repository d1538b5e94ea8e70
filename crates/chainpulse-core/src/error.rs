//! Error types for chainpulse-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
