//! Retry logic for transient download failures
//!
//! Exponential backoff without jitter; artifact downloads are sequential
//! and low-volume, so bounded delay growth is all that matters here.

use crate::error::Error;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Classifies whether an error is worth retrying
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Download { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

/// Backoff policy for artifact downloads
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,
    /// Factor applied to the delay after each retry
    pub backoff_multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            backoff_multiplier: 2,
        }
    }
}

impl RetryConfig {
    /// Delay before retrying after `attempt` failures (1-based)
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.initial_delay_ms.saturating_mul(u64::from(factor)))
    }
}

/// Run `operation`, retrying retryable failures with exponential backoff
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    E: IsRetryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_attempts && e.is_retryable() => {
                let delay = config.delay_for(attempt);
                warn!(
                    "attempt {attempt}/{} failed ({e}), retrying in {delay:?}",
                    config.max_attempts
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
