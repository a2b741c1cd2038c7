//! Exponential backoff between install attempts.

use std::time::Duration;

/// Default backoff unit.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Delay schedule: `unit * 2^(attempt-1)` after attempt `attempt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    unit: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF_UNIT)
    }
}

impl Backoff {
    /// Create a schedule with the given unit.
    pub fn new(unit: Duration) -> Self {
        Self { unit }
    }

    /// The time unit.
    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Delay after the given 1-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.unit.saturating_mul(factor)
    }
}

/// Blocking sleep, replaceable in tests.
pub trait Sleeper: Send + Sync {
    /// Sleep for the given duration.
    fn sleep(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
