//! # Running-task tracker with sequence-based ordering.
//!
//! Maintains the set of task names currently running under one supervisor,
//! using event sequence numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! runner ──► Bus ──► supervisor listener ──► AliveTracker::update()
//!                                                   │
//!                                                   ▼
//!                                        HashMap<String, TaskState>
//!                                            (name → {seq, alive})
//! ```
//!
//! ## Rules
//! - Only `TaskStarting` / `TaskStopped` / `TaskFailed` change alive state
//! - Read operations (`snapshot`) are **eventually consistent**
//! - Events with `seq <= last_seq` are **rejected** (stale)

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

/// Per-task state for ordering validation.
#[derive(Debug, Clone)]
struct TaskState {
    /// Last seen sequence number for this task.
    last_seq: u64,
    /// Current status (true = running).
    alive: bool,
}

/// Thread-safe tracker of running tasks.
///
/// Used by [`Supervisor::shutdown`](crate::Supervisor::shutdown) to name the
/// tasks that did not stop within the grace period.
pub(crate) struct AliveTracker {
    state: RwLock<HashMap<String, TaskState>>,
}

impl AliveTracker {
    /// Creates a new empty tracker.
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Updates task state if the event is newer than the last one seen for that task.
    ///
    /// Returns `true` when the alive flag was written.
    pub(crate) async fn update(&self, ev: &Event) -> bool {
        let alive = match ev.kind {
            EventKind::TaskStarting => true,
            EventKind::TaskStopped | EventKind::TaskFailed => false,
            _ => return false,
        };
        let Some(name) = ev.task.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(TaskState {
            last_seq: 0,
            alive: false,
        });
        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        entry.alive = alive;
        true
    }

    /// Returns sorted list of currently running task names.
    pub(crate) async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut alive: Vec<String> = state
            .iter()
            .filter(|(_, ts)| ts.alive)
            .map(|(name, _)| name.clone())
            .collect();
        alive.sort_unstable();
        alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stale_events_are_rejected() {
        let tracker = AliveTracker::new();
        let starting = Event::new(EventKind::TaskStarting).with_task("watcher");
        let stopped = Event::new(EventKind::TaskStopped).with_task("watcher");

        assert!(tracker.update(&stopped).await);
        assert!(!tracker.update(&starting).await);
        assert!(tracker.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_sorted() {
        let tracker = AliveTracker::new();
        for name in ["reconcile", "deployment", "watcher"] {
            tracker
                .update(&Event::new(EventKind::TaskStarting).with_task(name))
                .await;
        }
        tracker
            .update(&Event::new(EventKind::TaskFailed).with_task("watcher"))
            .await;
        assert_eq!(tracker.snapshot().await, vec!["deployment", "reconcile"]);
    }
}
