//! Exponential backoff for transient warehouse failures
//!
//! A [`RetryPolicy`] produces a non-decreasing delay sequence
//! `initial, initial * m, initial * m^2, ...` capped at `max_interval`.
//! [`retry_with_backoff`] drives an operation with it, stopping after
//! `max_retries` retries or as soon as sleeping the next delay would take the
//! whole sequence past `max_elapsed_time`, whichever comes first.

use crate::domain::{Result, SextantError};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Backoff parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    initial_interval: Duration,
    max_interval: Duration,
    multiplier: f64,
    max_elapsed_time: Duration,
    max_retries: usize,
}

impl RetryPolicy {
    /// Creates a policy
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the multiplier is below 1 or not
    /// finite, or if the initial interval exceeds the maximum interval.
    pub fn new(
        initial_interval: Duration,
        max_interval: Duration,
        multiplier: f64,
        max_elapsed_time: Duration,
        max_retries: usize,
    ) -> Result<Self> {
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(SextantError::Configuration(format!(
                "retry.backoff_multiplier must be >= 1, got {multiplier}"
            )));
        }
        if initial_interval > max_interval {
            return Err(SextantError::Configuration(format!(
                "retry.initial_delay_ms ({}) must not exceed retry.max_delay_ms ({})",
                initial_interval.as_millis(),
                max_interval.as_millis()
            )));
        }

        Ok(Self {
            initial_interval,
            max_interval,
            multiplier,
            max_elapsed_time,
            max_retries,
        })
    }

    /// The warehouse client's standard schedule: 15 s doubling to 60 s, at
    /// most 120 s in total
    pub fn warehouse_default(max_retries: usize) -> Self {
        Self {
            initial_interval: Duration::from_secs(15),
            max_interval: Duration::from_secs(60),
            multiplier: 2.0,
            max_elapsed_time: Duration::from_secs(120),
            max_retries,
        }
    }

    /// Maximum number of retries after the first attempt
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Wall-clock budget for the whole sequence
    pub fn max_elapsed_time(&self) -> Duration {
        self.max_elapsed_time
    }

    /// Delay before retry number `retry` (0-based)
    pub fn delay_for(&self, retry: usize) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial_interval.as_secs_f64() * self.multiplier.powi(exponent);
        // f64::min discards NaN and clamps infinity
        Duration::from_secs_f64(secs.min(self.max_interval.as_secs_f64()))
    }

    /// Unbounded delay sequence, ignoring both limits
    ///
    /// ```
    /// use sextant::core::retry::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::warehouse_default(5);
    /// let delays: Vec<u64> = policy.backoff_schedule().take(4).map(|d| d.as_secs()).collect();
    /// assert_eq!(delays, vec![15, 30, 60, 60]);
    /// ```
    pub fn backoff_schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..).map(move |retry| self.delay_for(retry))
    }

    /// Delay to sleep before the next retry, or `None` when either limit
    /// forbids another attempt
    pub fn next_delay(&self, retries_done: usize, elapsed: Duration) -> Option<Duration> {
        if retries_done >= self.max_retries {
            return None;
        }
        let delay = self.delay_for(retries_done);
        if elapsed + delay > self.max_elapsed_time {
            return None;
        }
        Some(delay)
    }

    /// Delays the loop would sleep if every attempt failed instantly
    pub fn planned_delays(&self) -> Vec<Duration> {
        let mut delays = Vec::new();
        let mut elapsed = Duration::ZERO;
        while let Some(delay) = self.next_delay(delays.len(), elapsed) {
            elapsed += delay;
            delays.push(delay);
        }
        delays
    }
}

/// Runs `operation`, retrying transient failures according to `policy`
///
/// Non-transient errors are returned immediately. When the budget runs out the
/// last transient error is returned unchanged.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let mut retries_done = 0;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => return Err(e),
            Err(e) => e,
        };

        match policy.next_delay(retries_done, started.elapsed()) {
            Some(delay) => {
                crate::log_retry_attempt!(
                    retries_done + 1,
                    policy.max_retries(),
                    delay,
                    &error
                );
                tokio::time::sleep(delay).await;
                retries_done += 1;
            }
            None => {
                tracing::warn!(
                    operation = operation_name,
                    retries = retries_done,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %error,
                    "Retry budget exhausted"
                );
                return Err(error);
            }
        }
    }
}
