//! # Drive one task to completion.
//!
//! Executes a [`Task`] once under the given cancellation token and publishes its
//! lifecycle events to the [`Bus`].
//!
//! ## Event flow
//! ```text
//! Success / cancellation:
//!   TaskStarting → task.spawn() → Ok(()) | Err(Canceled) → TaskStopped
//!
//! Failure:
//!   TaskStarting → task.spawn() → Err(e) → TaskFailed
//!
//! Panic:
//!   TaskStarting → task.spawn() → panic → Err(Fail("task panicked: ..")) → TaskFailed
//! ```
//!
//! ## Rules
//! - Always publishes **exactly one** terminal event: `TaskStopped` or `TaskFailed`
//! - `Canceled` is passed through so the caller can tell it apart from `Ok`
//! - A panic never escapes: it becomes an ordinary failure of the task

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::{
    error::TaskError,
    events::{Bus, Event, EventKind},
    tasks::TaskBox,
};

/// Runs `task` to completion, publishing lifecycle events tagged with `scope`.
pub(crate) async fn run_task(
    task: TaskBox,
    ctx: CancellationToken,
    bus: Bus,
    scope: Arc<str>,
) -> Result<(), TaskError> {
    let name: Arc<str> = Arc::from(task.name());
    bus.publish(
        Event::new(EventKind::TaskStarting)
            .with_scope(Arc::clone(&scope))
            .with_task(Arc::clone(&name)),
    );

    let fut = task.spawn(ctx);
    let res = match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(res) => res,
        Err(panic_err) => Err(TaskError::fail(format!(
            "task panicked: {}",
            panic_message(&*panic_err)
        ))),
    };

    match &res {
        Ok(()) | Err(TaskError::Canceled) => bus.publish(
            Event::new(EventKind::TaskStopped)
                .with_scope(scope)
                .with_task(name),
        ),
        Err(e) => bus.publish(
            Event::new(EventKind::TaskFailed)
                .with_scope(scope)
                .with_task(name)
                .with_reason(e.to_string()),
        ),
    }
    res
}

/// Extracts a printable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
