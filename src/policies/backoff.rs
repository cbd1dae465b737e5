//! # Backoff between consecutive status-watcher restarts.
//!
//! The delay before restart `n` (0-indexed, counted since the last notification
//! that was processed successfully) is `first × factor^n`, clamped to `max`,
//! then jittered. The base is derived purely from `n`, so jitter never feeds
//! back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use unitvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(100));
//! assert_eq!(backoff.next(1), Duration::from_millis(200));
//! assert_eq!(backoff.next(10), Duration::from_secs(10));
//! assert_eq!(BackoffPolicy::none().next(7), Duration::ZERO);
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Restart backoff policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first restart.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter applied on top of the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns an exponential policy: `first = 100ms`, `factor = 2.0`, `max = 30s`, equal jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
        }
    }
}

impl BackoffPolicy {
    /// A policy that never waits.
    pub const fn none() -> Self {
        Self {
            first: Duration::ZERO,
            max: Duration::ZERO,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// True if every delay produced by this policy is zero.
    pub fn is_none(&self) -> bool {
        self.first.is_zero() || self.max.is_zero()
    }

    /// Computes the delay before restart number `attempt` (0-indexed).
    pub fn next(&self, attempt: u32) -> Duration {
        if self.is_none() {
            return Duration::ZERO;
        }
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}
