//! Retry with exponential backoff for idempotent gateway requests.
//!
//! Only requests that are safe to repeat (reads and deletes) go through
//! here, and only transport failures that [`TransportError::is_retryable`]
//! accepts are retried. Any HTTP answer, including an error status, is
//! returned to the caller as-is.
//!
//! # Example
//!
//! ```rust,no_run
//! use converge_gateway::retry::{with_retry_if, RetryConfig};
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! async fn example() -> Result<(), MyError> {
//!     with_retry_if(
//!         &RetryConfig::default(),
//!         || async { Err(MyError::Transient) },
//!         |err| matches!(err, MyError::Transient),
//!     )
//!     .await
//! }
//! ```
//!
//! [`TransportError::is_retryable`]: crate::TransportError::is_retryable

use std::time::Duration;
use tokio::time::sleep;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Base for exponential backoff (typically 2.0)
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    /// A configuration that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::from_millis(0),
            max_delay: Duration::from_millis(0),
            exponential_base: 1.0,
        }
    }

    /// Delay to wait after `delay`, capped at `max_delay`.
    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::from_secs_f64(
            (delay.as_secs_f64() * self.exponential_base).min(self.max_delay.as_secs_f64()),
        )
    }
}

/// Execute a function with retries, retrying only errors accepted by
/// `is_retryable`.
///
/// The function is called up to `max_attempts` times. A non-retryable error
/// is returned immediately; otherwise the last error is returned once the
/// attempts run out.
pub async fn with_retry_if<F, Fut, T, E, P>(
    config: &RetryConfig,
    mut f: F,
    mut is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
    P: FnMut(&E) -> bool,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match f().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if !is_retryable(&e) => {
                tracing::debug!(error = ?e, "Error is not retryable, returning immediately");
                return Err(e);
            }
            Err(e) if attempt >= config.max_attempts => {
                tracing::error!(attempts = attempt, error = ?e, "All retry attempts exhausted");
                return Err(e);
            }
            Err(e) => {
                tracing::warn!(
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    error = ?e,
                    "Request failed, retrying"
                );

                sleep(delay).await;
                delay = config.next_delay(delay);
            }
        }
    }
}
