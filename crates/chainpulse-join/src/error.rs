//! Join error types.
//!
//! Every variant is a per-message condition: the runner reports it and
//! moves on to the next primary message.

use chainpulse_core::Topic;
use chainpulse_lookup::LookupError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JoinError {
    #[error("Unexpected payload on {topic}: {kind}")]
    UnexpectedPayload { topic: Topic, kind: &'static str },

    #[error("Missing auxiliary value for {0}")]
    MissingAux(Topic),

    #[error("Lookup failed for block {block}: {source}")]
    Lookup { block: u64, source: LookupError },
}

pub type JoinResult<T> = Result<T, JoinError>;
