//! Retry policy and executor.
//!
//! Policy (attempt count, delay) is a value, decoupled from the call
//! site; the executor applies it to any fallible async attempt.

use crate::error::{LookupError, LookupResult};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Bounded-retry policy, stateless across calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum attempts, at least 1.
    pub max_attempts: u32,
    /// Delay before every attempt, including the first.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Run `attempt` up to `policy.max_attempts` times.
///
/// Each attempt is preceded by `policy.delay` (the data behind a lookup
/// typically isn't available the instant its trigger arrives). An attempt
/// resolving to `Ok(None)` means the response lacked its success marker;
/// both that and transport errors are retryable. When the budget runs
/// out, the distinct [`LookupError::Exhausted`] is returned.
pub async fn retry_with_policy<T, F, Fut>(
    policy: RetryPolicy,
    label: &str,
    mut attempt: F,
) -> LookupResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = LookupResult<Option<T>>>,
{
    for n in 1..=policy.max_attempts {
        tokio::time::sleep(policy.delay).await;

        match attempt().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {
                debug!(label, attempt = n, "No success marker in response, retrying");
            }
            Err(e) => {
                debug!(label, attempt = n, error = %e, "Attempt failed, retrying");
            }
        }
    }

    Err(LookupError::Exhausted {
        attempts: policy.max_attempts,
    })
}
