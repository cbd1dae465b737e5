//! # LogWriter: renders events through `tracing`
//!
//! A subscriber that turns incoming [`Event`]s into structured `tracing` records.
//! Supervision failures and watcher trouble are logged at `warn`, routine
//! lifecycle at `info`, per-batch chatter at `debug`.
//!
//! ## Example output (with a fmt subscriber installed)
//! ```text
//! INFO  unitvisor: task starting scope="gitlab" task="reconcile"
//! WARN  unitvisor: status watcher restarting scope="gitlab" reason="connection reset"
//! DEBUG unitvisor: status reported scope="gitlab" units=3
//! INFO  unitvisor: supervisor terminated scope="gitlab" reason=None
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let scope = e.scope.as_deref().unwrap_or("-");
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref();
        match e.kind {
            EventKind::TaskStarting => info!(scope, task, "task starting"),
            EventKind::TaskStopped => info!(scope, task, "task stopped"),
            EventKind::TaskFailed => warn!(scope, task, ?reason, "task failed"),
            EventKind::TaskRejected => warn!(scope, task, "task rejected by terminal supervisor"),
            EventKind::StopRequested => info!(scope, ?reason, "stop requested"),
            EventKind::Terminated => info!(scope, ?reason, "supervisor terminated"),
            EventKind::GraceExceeded => {
                warn!(scope, grace_ms = ?e.delay_ms, stuck = ?e.count, "grace exceeded")
            }
            EventKind::MembershipChanged => debug!(scope, members = ?e.count, "membership changed"),
            EventKind::MembershipHandedOff => {
                debug!(scope, members = ?e.count, "membership handed off")
            }
            EventKind::StatusReported => debug!(scope, units = ?e.count, ?reason, "status reported"),
            EventKind::StatusWatchRestarting => {
                warn!(scope, ?reason, delay_ms = ?e.delay_ms, "status watcher restarting")
            }
            EventKind::ApplicationGone => warn!(scope, ?reason, "application has disappeared"),
            EventKind::SubscriberOverflow => warn!(subscriber = task, ?reason, "subscriber dropped event"),
            EventKind::SubscriberPanicked => warn!(subscriber = task, ?reason, "subscriber panicked"),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
