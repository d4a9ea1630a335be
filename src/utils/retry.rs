//! Retry utilities for transient transport failures
//!
//! Exponential backoff with optional jitter, used by the HTTP transport for
//! throttling (429) and gateway/server statuses as well as connect failures.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::errors::{TransportError, TransportResult};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub jitter: bool,
    /// HTTP statuses worth another attempt
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    pub fn from_http_config(config: &HttpConfig) -> Self {
        Self {
            max_attempts: config.max_retries + 1,
            initial_delay: config.backoff_initial,
            max_delay: config.backoff_max,
            backoff_multiplier: 2.0,
            jitter: true,
            retry_statuses: config.retry_statuses.clone(),
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Execute a transport operation with retry logic
///
/// Returns the first success, the first non-retryable error, or the last
/// error once `max_attempts` is exhausted.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
    operation_name: &str,
) -> TransportResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = TransportResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(
                        "Operation '{}' succeeded on attempt {}/{}",
                        operation_name, attempt, max_attempts
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_retryable(&config.retry_statuses) {
                    debug!(
                        "Operation '{}' failed with non-retryable error: {}",
                        operation_name, err
                    );
                    return Err(err);
                }

                if attempt >= max_attempts {
                    warn!(
                        "Operation '{}' failed after {} attempts: {}",
                        operation_name, max_attempts, err
                    );
                    return Err(err);
                }

                let delay = calculate_delay(config, attempt);
                debug!(
                    "Operation '{}' failed on attempt {}/{}, retrying in {:?}: {}",
                    operation_name, attempt, max_attempts, delay, err
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Delay before the retry following `attempt` (1-based)
pub fn calculate_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16) as i32;
    let base_ms = config.initial_delay.as_millis() as f64 * config.backoff_multiplier.powi(exponent);
    let capped_ms = base_ms.min(config.max_delay.as_millis() as f64) as u64;

    let delay_ms = if config.jitter && capped_ms > 0 {
        // up to 25% extra, still bounded by max_delay
        let jitter = rand::rng().random_range(0..=capped_ms / 4);
        (capped_ms + jitter).min(config.max_delay.as_millis() as u64)
    } else {
        capped_ms
    };

    Duration::from_millis(delay_ms)
}

/// Convenience for transport errors produced by a timed-out future
pub fn timeout_error(url: &str) -> TransportError {
    TransportError::Timeout {
        url: url.to_string(),
    }
}
