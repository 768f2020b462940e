/// Retry policy with exponential backoff and an attempt budget
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for a single delay
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Add random jitter to backoff (±30%)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based).
    ///
    /// `initial_backoff * backoff_multiplier^(attempt - 1)`, capped at
    /// `max_backoff`. Attempt 0 is treated as the first retry.
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base_millis = self.initial_backoff.as_millis() as f64;
        let multiplied = base_millis * self.backoff_multiplier.powi(exponent);
        let millis = multiplied.min(self.max_backoff.as_millis() as f64) as u64;

        calculate_backoff(Duration::from_millis(millis), self.jitter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    #[error("Max retries ({0}) exceeded")]
    MaxRetriesExceeded(u32),
}

/// Consecutive-failure counter driven by a [`RetryConfig`].
///
/// Each call to [`RetryState::next_delay`] consumes one attempt from the
/// budget. The counter only goes back to zero through [`RetryState::reset`],
/// which callers invoke after a successful attempt.
#[derive(Debug, Clone)]
pub struct RetryState {
    config: RetryConfig,
    attempts: u32,
}

impl RetryState {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Attempts consumed since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.config.max_retries
    }

    pub fn reset(&mut self) {
        if self.attempts > 0 {
            debug!(attempts = self.attempts, "Retry budget reset");
        }
        self.attempts = 0;
    }

    /// Record a failure and return how long to wait before the next attempt.
    ///
    /// Returns `MaxRetriesExceeded` once the budget is spent; the counter is
    /// left untouched in that case.
    pub fn next_delay(&mut self) -> Result<Duration, RetryError> {
        if self.is_exhausted() {
            warn!("Max retries ({}) reached", self.config.max_retries);
            return Err(RetryError::MaxRetriesExceeded(self.config.max_retries));
        }

        self.attempts += 1;
        let delay = self.config.backoff_duration(self.attempts);

        warn!(
            "Retry attempt {}/{}, waiting {:?}",
            self.attempts, self.config.max_retries, delay
        );

        Ok(delay)
    }
}

fn calculate_backoff(base: Duration, jitter: bool) -> Duration {
    if jitter {
        let mut rng = rand::thread_rng();
        let jitter_factor = 1.0 + rng.gen_range(-0.3..0.3); // ±30%
        Duration::from_millis((base.as_millis() as f64 * jitter_factor) as u64)
    } else {
        base
    }
}
