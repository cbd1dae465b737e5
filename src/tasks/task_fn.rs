//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: FnOnce(CancellationToken) -> Fut`. The closure is
//! called exactly once, when the supervisor starts the task, so it may move owned
//! state (channel ends, handles) straight into the future.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use unitvisor::{TaskBox, TaskError, TaskFn};
//!
//! let t: TaskBox = TaskFn::boxed("worker", |ctx: CancellationToken| async move {
//!     ctx.cancelled().await;
//!     Ok::<_, TaskError>(())
//! });
//!
//! assert_eq!(t.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::{BoxTaskFuture, Task, TaskBox};

/// Function-backed task implementation.
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::boxed`] when you immediately need a [`TaskBox`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F, Fut> TaskFn<F>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    /// Creates the task and returns it as an owned [`TaskBox`].
    pub fn boxed(name: impl Into<Cow<'static, str>>, f: F) -> TaskBox {
        Box::new(Self::new(name, f))
    }
}

impl<F, Fut> Task for TaskFn<F>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(self: Box<Self>, ctx: CancellationToken) -> BoxTaskFuture {
        Box::pin((self.f)(ctx))
    }
}

impl<F> std::fmt::Debug for TaskFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskFn").field("name", &self.name).finish()
    }
}
