//! # Runtime events emitted by supervisors and the reconciliation loop.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Supervision events**: task start/exit, stop requests, terminal state
//! - **Reconciliation events**: membership changes, status batches, watcher restarts
//! - **Subscriber events**: overflow and panics inside subscribers
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! supervisor scope, task name, reasons, counts and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use unitvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_scope("gitlab")
//!     .with_task("deployment")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("deployment"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `task` (subscriber name) and `reason` (panic info).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `task` (subscriber name) and `reason` ("full" / "closed").
    SubscriberOverflow,

    // === Supervision events ===
    /// A task was started under a supervisor.
    ///
    /// Sets `scope`, `task`.
    TaskStarting,

    /// A task exited cleanly (`Ok` or observed cancellation).
    ///
    /// Sets `scope`, `task`.
    TaskStopped,

    /// A task exited with an error.
    ///
    /// Sets `scope`, `task`, `reason`.
    TaskFailed,

    /// A task was handed to a terminal supervisor and never started.
    ///
    /// Sets `scope`, `task`.
    TaskRejected,

    /// The supervisor was asked to stop.
    ///
    /// Sets `scope`, and `reason` when the stop carries an error.
    StopRequested,

    /// Every owned task has exited; the supervisor is terminal.
    ///
    /// Sets `scope`, and `reason` when an error was recorded.
    Terminated,

    /// Grace period exceeded while waiting for a supervisor to terminate.
    ///
    /// Sets `scope`, `delay_ms` (the grace), `count` (stuck tasks).
    GraceExceeded,

    // === Reconciliation events ===
    /// The live membership set changed after a desired-state batch.
    ///
    /// Sets `scope`, `count` (live members after the batch).
    MembershipChanged,

    /// The live membership set was handed to the deployment worker.
    ///
    /// Sets `scope`, `count`.
    MembershipHandedOff,

    /// A status batch was submitted to the update sink.
    ///
    /// Sets `scope`, `count` (units in the batch), `reason` when the sink said "not found".
    StatusReported,

    /// The substrate status watcher ended and will be re-subscribed.
    ///
    /// Sets `scope`, `reason`, and `delay_ms` when a backoff applies.
    StatusWatchRestarting,

    /// The application's substrate resource disappeared; the loop exits cleanly.
    ///
    /// Sets `scope`, `reason`.
    ApplicationGone,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the supervisor (application) the event belongs to.
    pub scope: Option<Arc<str>>,
    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Size of whatever the event talks about (members, units, stuck tasks).
    pub count: Option<u32>,
    /// Delay or grace in milliseconds (compact).
    pub delay_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            scope: None,
            task: None,
            reason: None,
            count: None,
            delay_ms: None,
        }
    }

    /// Attaches the supervisor scope.
    #[inline]
    pub fn with_scope(mut self, scope: impl Into<Arc<str>>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a count (saturating at `u32::MAX`).
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}
