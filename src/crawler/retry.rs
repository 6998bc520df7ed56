//! Bounded retry with a fixed delay between attempts
//!
//! Item page fetches and file downloads run through [`RetryPolicy::attempt`].
//! Failures are logged per attempt and, once attempts run out, collapsed into
//! a [`TerminalFailure`] that callers turn into a sentinel value.

use crate::config::CrawlerConfig;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// An operation that failed on every allowed attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed after {attempts} attempts: {last_error}")]
pub struct TerminalFailure {
    /// Number of attempts made
    pub attempts: u32,

    /// Description of the error from the final attempt
    pub last_error: String,
}

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy making at most `max_attempts` attempts (at least one)
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(config.retry_attempts, config.retry_delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `operation` until it succeeds or attempts run out
    ///
    /// The operation receives the 1-based attempt number. Every attempt is
    /// logged at debug level and every failure as a warning; the delay is
    /// slept between attempts but not after the last one.
    ///
    /// # Arguments
    ///
    /// * `label` - What is being attempted, usually a URL; used in log lines
    /// * `operation` - Produces one attempt's future
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The first successful attempt's value
    /// * `Err(TerminalFailure)` - Every attempt failed
    pub async fn attempt<T, E, F, Fut>(
        &self,
        label: &str,
        mut operation: F,
    ) -> Result<T, TerminalFailure>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            tracing::debug!("Attempt {}/{} for {}", attempt, self.max_attempts, label);

            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt,
                        self.max_attempts,
                        label,
                        e
                    );
                    last_error = e.to_string();

                    if attempt < self.max_attempts && !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
            }
        }

        Err(TerminalFailure {
            attempts: self.max_attempts,
            last_error,
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}
