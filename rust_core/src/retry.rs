//! Bounded retry for move submission
//!
//! Fixed backoff between attempts. Only transient transport errors are
//! retried; anything else is returned on the first failure.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait between a failed attempt and the next one
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Execute a server call, retrying transient failures per `policy`
///
/// # Example
/// ```ignore
/// use herring_rust_core::retry::{execute_with_retry, RetryPolicy};
///
/// execute_with_retry("move e2e4", RetryPolicy::default(), || {
///     server.make_move("abcd1234", "e2e4")
/// })
/// .await?;
/// ```
pub async fn execute_with_retry<F, Fut, T>(
    label: &str,
    policy: RetryPolicy,
    mut f: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < policy.max_attempts && e.is_transient() => {
                warn!(
                    "{} failed, retrying in {:?} (attempt {}/{}): {}",
                    label, policy.backoff, attempt, policy.max_attempts, e
                );
                tokio::time::sleep(policy.backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}
