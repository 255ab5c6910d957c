//! Sliding-window rate limiter for outbound calls.

use crate::clock::{Clock, SystemClock};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Length of the rolling window.
pub const WINDOW_MILLIS: i64 = 60_000;

/// The limiter rejected a call. Nothing was recorded for it.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Rate limit exceeded. Please wait {retry_after_seconds} seconds.")]
pub struct RateLimitExceeded {
    /// Whole seconds until the oldest call leaves the window.
    pub retry_after_seconds: u64,
}

/// Timestamps of admitted calls inside the trailing window, oldest first.
#[derive(Debug, Default)]
pub struct CallWindow {
    timestamps: VecDeque<i64>,
}

impl CallWindow {
    /// Drop every entry at or before `window_start`.
    fn prune(&mut self, window_start: i64) {
        while self
            .timestamps
            .front()
            .is_some_and(|&oldest| oldest <= window_start)
        {
            self.timestamps.pop_front();
        }
    }

    fn oldest(&self) -> Option<i64> {
        self.timestamps.front().copied()
    }

    fn record(&mut self, now: i64) {
        self.timestamps.push_back(now);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Admission control for outbound calls: at most `limit` calls in any
/// trailing 60 second window.
///
/// Local and advisory (no coordination with the server). The
/// read-prune-append sequence runs under one lock so concurrent callers
/// cannot overshoot the limit.
pub struct RateLimiter {
    limit: u32,
    clock: Arc<dyn Clock>,
    window: Mutex<CallWindow>,
}

impl RateLimiter {
    /// Create a limiter on the system clock.
    pub fn new(limit: u32) -> Self {
        Self::with_clock(limit, Arc::new(SystemClock))
    }

    /// Create a limiter on an explicit clock.
    pub fn with_clock(limit: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            clock,
            window: Mutex::new(CallWindow::default()),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Claim a slot for one outbound call.
    ///
    /// Never waits. A limit of 0 rejects every call.
    pub fn reserve(&self) -> Result<(), RateLimitExceeded> {
        let mut window = self.window.lock();
        let now = self.clock.now_millis();
        window.prune(now - WINDOW_MILLIS);

        if window.len() >= self.limit as usize {
            let wait_ms = match window.oldest() {
                Some(oldest) => oldest + WINDOW_MILLIS - now,
                None => WINDOW_MILLIS,
            };
            if wait_ms > 0 {
                let retry_after_seconds = (wait_ms as u64).div_ceil(1000);
                warn!(
                    limit = self.limit,
                    in_window = window.len(),
                    retry_after_seconds,
                    "Rate limit exceeded"
                );
                return Err(RateLimitExceeded {
                    retry_after_seconds,
                });
            }
        }

        window.record(now);
        Ok(())
    }

    /// Number of calls currently counted against the window.
    pub fn in_window(&self) -> usize {
        let mut window = self.window.lock();
        let now = self.clock.now_millis();
        window.prune(now - WINDOW_MILLIS);
        window.len()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limit", &self.limit)
            .field("in_window", &self.window.lock().len())
            .finish_non_exhaustive()
    }
}
