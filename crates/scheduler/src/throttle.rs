//! Trailing-edge throttling for frame-driven recomputation
//!
//! A `Throttle` guarantees at most one execution per interval. The first call
//! in an open window executes immediately (leading edge). Calls made while the
//! window is closed replace a single pending value, which is released by
//! `poll` at the first frame at or after the window end (trailing edge).

use std::time::{Duration, Instant};

/// Default minimum spacing between executions (110ms)
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_millis(110);

/// Rate limiter with leading and trailing edge execution
///
/// The throttle never runs anything itself. `call` and `poll` hand back the
/// value that should be executed now, or `None` when the caller must wait.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    /// Minimum time between executions
    interval: Duration,

    /// When the last execution was handed out
    last_run: Option<Instant>,

    /// Latest value submitted inside a closed window
    pending: Option<T>,
}

impl<T> Throttle<T> {
    /// Create a throttle with the given interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: None,
        }
    }

    /// Get the throttle interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Submit a value
    ///
    /// Returns `Some(value)` when the window is open and the value should be
    /// executed now. Otherwise the value replaces any pending one and `None`
    /// is returned.
    pub fn call(&mut self, now: Instant, value: T) -> Option<T> {
        if self.window_open(now) {
            self.last_run = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Release the pending value if its window has elapsed
    ///
    /// Releasing restarts the window at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_none() || !self.window_open(now) {
            return None;
        }
        self.last_run = Some(now);
        self.pending.take()
    }

    /// Check whether a trailing execution is waiting
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending value becomes releasable, if there is one
    pub fn deadline(&self) -> Option<Instant> {
        match (&self.pending, self.last_run) {
            (Some(_), Some(last)) => Some(last + self.interval),
            _ => None,
        }
    }

    /// Drop any pending value without executing it
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take()
    }

    fn window_open(&self, now: Instant) -> bool {
        match self.last_run {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }
}

impl<T> Default for Throttle<T> {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_INTERVAL)
    }
}
