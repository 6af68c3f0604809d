//! Elapsed-time accumulators checked once per tick.

use std::time::Duration;

/// The game clock: counts down from a fixed total, one `dt` per tick.
///
/// Clamped at zero. [`advance`](Self::advance) reports expiry on exactly
/// one call, so the caller can hang the time-out decision off it without
/// extra bookkeeping.
#[derive(Debug, Clone)]
pub struct Countdown {
    total: Duration,
    remaining: Duration,
    running: bool,
    expired: bool,
}

impl Countdown {
    /// A stopped clock holding `total`.
    pub fn new(total: Duration) -> Self {
        Self {
            total,
            remaining: total,
            running: false,
            expired: false,
        }
    }

    /// Rewinds to the full duration and starts counting.
    pub fn start(&mut self) {
        self.remaining = self.total;
        self.running = true;
        self.expired = false;
    }

    /// Freezes the clock where it is. Further `advance` calls are no-ops.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Decrements by `dt`. Returns `true` on the call that reaches zero.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.running || self.expired {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(dt);
        if self.remaining.is_zero() {
            self.expired = true;
            self.running = false;
            return true;
        }
        false
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

/// Accumulates elapsed time toward a threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stopwatch {
    elapsed: Duration,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `dt` to the accumulated time.
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// `true` once at least `threshold` has accumulated.
    pub fn has_reached(&self, threshold: Duration) -> bool {
        self.elapsed >= threshold
    }
}
