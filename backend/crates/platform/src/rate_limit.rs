//! Rate Limiting Infrastructure
//!
//! Fixed-window counters. The window transition is a pure function so every
//! store (PostgreSQL, in-memory) applies exactly the same rule inside its own
//! transaction.

use std::time::Duration;

use crate::transaction::TxOutcome;

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Rate limit check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

/// Persisted state of one counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub count: u32,
    pub window_start_ms: i64,
}

impl WindowState {
    fn fresh(now_ms: i64) -> Self {
        Self {
            count: 1,
            window_start_ms: now_ms,
        }
    }

    /// Result reported to the caller after this state was committed.
    pub fn admitted(&self, config: &RateLimitConfig) -> RateLimitResult {
        RateLimitResult {
            allowed: true,
            remaining: config.max_requests.saturating_sub(self.count),
            reset_at_ms: self.window_start_ms + config.window_ms(),
        }
    }

    fn denied(&self, config: &RateLimitConfig) -> RateLimitResult {
        RateLimitResult {
            allowed: false,
            remaining: 0,
            reset_at_ms: self.window_start_ms + config.window_ms(),
        }
    }
}

/// Advance a counter by one request.
///
/// * absent: start a window with count 1
/// * `now - window_start > window`: restart the window with count 1
/// * `count >= max_requests`: deny, nothing is written
/// * otherwise: increment
///
/// The window is inclusive at its end: a request exactly `window` after the
/// start still counts against it.
pub fn advance(
    current: Option<WindowState>,
    now_ms: i64,
    config: &RateLimitConfig,
) -> TxOutcome<WindowState, RateLimitResult> {
    let next = match current {
        None => WindowState::fresh(now_ms),
        Some(state) if now_ms - state.window_start_ms > config.window_ms() => {
            WindowState::fresh(now_ms)
        }
        Some(state) if state.count >= config.max_requests => {
            return TxOutcome::Abort(state.denied(config));
        }
        Some(state) => WindowState {
            count: state.count + 1,
            ..state
        },
    };

    if next.count > config.max_requests {
        // Only reachable with max_requests == 0.
        return TxOutcome::Abort(next.denied(config));
    }
    TxOutcome::Commit(next)
}
