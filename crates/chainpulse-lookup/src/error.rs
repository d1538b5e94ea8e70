//! Lookup error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    /// Every permitted attempt failed. An expected outcome: callers skip
    /// the triggering message and continue.
    #[error("Lookup exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

pub type LookupResult<T> = Result<T, LookupError>;
