//! Retry policy with exponential backoff.
//!
//! Both remote clients (embedding and completion) run every request through
//! [`RetryPolicy::execute`]. The policy owns a [`Sleeper`] so backoff can be
//! observed in tests without waiting on the wall clock.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// Errors that know whether another attempt could succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Blocks the calling thread between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
    }
}

/// Bounded exponential backoff: attempt `n` (0-based) waits `base_delay * 2^n`
/// before running, the first attempt runs immediately.
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryPolicy {
    /// 3 attempts, 1 second base delay.
    pub fn exponential() -> Self {
        Self::new(3, Duration::from_secs(1))
    }

    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// A single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Replace the sleeper (tests use [`RecordingSleeper`]).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Delay before the given attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempt budget is exhausted. The last error is returned.
    pub fn execute<T, E, F>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        E: Retryable + fmt::Display,
    {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                self.sleeper.sleep(self.delay_for_attempt(attempt));
            }
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < self.max_attempts => {
                    warn!(
                        operation = label,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        next_delay_ms = self.delay_for_attempt(attempt + 1).as_millis() as u64,
                        "Retrying after error: {}",
                        err
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential()
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .finish()
    }
}
