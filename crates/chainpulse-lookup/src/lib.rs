//! Bounded-retry external lookups.
//!
//! A lookup is a point-in-time request for data not present in a streamed
//! event. Every lookup runs under a [`RetryPolicy`]; running out of
//! attempts is an expected outcome ([`LookupError::Exhausted`]) that
//! callers skip over, not a fatal condition.

pub mod error;
pub mod retry;
pub mod reward;

pub use error::{LookupError, LookupResult};
pub use retry::{retry_with_policy, RetryPolicy};
pub use reward::{BlockReward, RewardClient, RewardFetcher};
