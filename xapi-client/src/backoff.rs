//! Retry policies for the reconnect path
//!
//! When a call fails with a connection reset, the client discards the cached
//! connection and retries. The policy determines:
//! - How long to wait before each retry
//! - When to give up
//!
//! The attempt count is always bounded. Retrying a permanently unreachable
//! endpoint forever would turn one lost connection into a hang, so the
//! default policy caps at 3 attempts.
//!
//! # Built-in Policies
//!
//! - **ExponentialBackoff**: exponentially increasing delays (default)
//! - **FixedDelay**: constant delay between attempts
//! - **NoRetry**: fail on the first reset
//!
//! # Examples
//!
//! ```rust
//! use xapi_client::ExponentialBackoff;
//! use std::time::Duration;
//!
//! // Default: 100ms to 5s, max 3 attempts, with jitter
//! let default = ExponentialBackoff::default();
//!
//! // Custom: 1s to 30s, 5 attempts
//! let custom = ExponentialBackoff::new(
//!     Duration::from_secs(1),
//!     Duration::from_secs(30)
//! ).with_max_attempts(5);
//! ```

use std::time::Duration;

/// Trait for reconnect retry policies
///
/// The policy is consulted once per failed attempt. It is stateless with
/// respect to individual calls; the client passes the current attempt
/// number explicitly.
pub trait ReconnectPolicy: Send + Sync {
    /// Returns the delay before the next retry
    ///
    /// # Arguments
    ///
    /// * `attempt` - The current attempt number (0-indexed)
    ///
    /// # Returns
    ///
    /// - `Some(duration)`: wait this long, then retry
    /// - `None`: give up and propagate the connection-reset error
    fn delay_for(&self, attempt: u32) -> Option<Duration>;
}

/// Exponential backoff retry policy with optional jitter
pub struct ExponentialBackoff {
    min_delay: Duration,
    max_delay: Duration,
    max_attempts: u32,
    jitter: bool,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff policy with the default attempt cap
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            max_attempts: 3,
            jitter: false,
        }
    }

    /// Set the maximum number of attempts before giving up
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Enable jitter to prevent thundering herd
    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(5)).with_jitter()
    }
}

impl ReconnectPolicy for ExponentialBackoff {
    fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }

        // Exponential backoff: min_delay * 2^attempt, capped at max_delay
        let base_delay = self.min_delay.as_millis() as u64 * 2u64.pow(attempt);
        let delay = std::cmp::min(base_delay, self.max_delay.as_millis() as u64);

        let mut final_delay = Duration::from_millis(delay);

        // Add jitter if enabled (random 0-25% of delay)
        if self.jitter {
            use rand::Rng;
            let jitter_ms = rand::thread_rng().gen_range(0..=delay / 4);
            final_delay = Duration::from_millis(delay + jitter_ms);
        }

        Some(final_delay)
    }
}

/// Fixed delay retry policy
pub struct FixedDelay {
    delay: Duration,
    max_attempts: u32,
}

impl FixedDelay {
    /// Create a new fixed delay policy with the default attempt cap of 3
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: 3,
        }
    }

    /// Set the maximum number of attempts before giving up
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

impl ReconnectPolicy for FixedDelay {
    fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.delay)
    }
}

/// Retry policy that never retries
pub struct NoRetry;

impl ReconnectPolicy for NoRetry {
    fn delay_for(&self, _attempt: u32) -> Option<Duration> {
        None
    }
}
