//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable) and the owned handle type [`TaskBox`].
//!
//! A task receives a [`CancellationToken`] and should watch it to stop cooperatively
//! when its supervisor is dying. Tasks inside one failure domain are never restarted,
//! so [`Task::spawn`] consumes the task.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Future returned by [`Task::spawn`].
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send + 'static>>;

/// Owned, type-erased task.
pub type TaskBox = Box<dyn Task>;

/// # Asynchronous, cancelable, run-once unit.
///
/// A `Task` has a stable [`name`](Task::name) and a [`spawn`](Task::spawn) method that
/// turns it into a future driven by the supervisor.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use unitvisor::{BoxTaskFuture, Task};
///
/// struct Demo;
///
/// impl Task for Demo {
///     fn name(&self) -> &str { "demo" }
///
///     fn spawn(self: Box<Self>, ctx: CancellationToken) -> BoxTaskFuture {
///         Box::pin(async move {
///             ctx.cancelled().await;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Task: Send + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Converts the task into its running future.
    ///
    /// Returning `Ok(())` or `Err(TaskError::Canceled)` is a clean exit;
    /// any other error kills the owning supervisor.
    fn spawn(self: Box<Self>, ctx: CancellationToken) -> BoxTaskFuture;
}
