//! # Task abstractions.
//!
//! This module provides the task-related types a [`Supervisor`](crate::Supervisor) runs:
//! - [`Task`] - trait for async, cancelable, run-once units of work
//! - [`TaskFn`] - closure-backed task implementation
//! - [`TaskBox`] - owned, type-erased task (`Box<dyn Task>`)

mod task;
mod task_fn;

pub use task::{BoxTaskFuture, Task, TaskBox};
pub use task_fn::TaskFn;
