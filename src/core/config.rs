//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`], the settings shared by every supervisor a
//! worker builds.

use std::time::Duration;

/// Configuration for one supervisor.
///
/// ## Field semantics
/// - `grace`: how long [`Supervisor::shutdown`](crate::Supervisor::shutdown) waits for
///   every owned task to exit before reporting the stuck ones
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped)
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum time `shutdown` waits for the supervisor to become terminal.
    ///
    /// Expiry does not abort anything: tasks keep being awaited and
    /// `Supervisor::wait` still resolves only once all of them exit.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages
    /// observe `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl SupervisorConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            bus_capacity: 1024,
        }
    }
}
