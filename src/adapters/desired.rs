//! # Desired-state (control plane) contract.

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    core::Supervisor,
    error::{ApiError, RuntimeError, TaskError},
    model::Life,
    tasks::{TaskBox, TaskFn},
};

/// Control-plane view of an application's units.
#[async_trait]
pub trait DesiredState: Send + Sync + 'static {
    /// Subscribes to membership changes of `application`.
    ///
    /// Each item on the returned stream is a batch of unit identities whose
    /// membership or life may have changed. The stream is expected to stay
    /// open for the application's lifetime; closing it is fatal.
    async fn watch_members(&self, application: &str) -> Result<MembersWatch, ApiError>;

    /// Looks up the life of `unit`; [`ApiError::NotFound`] if it no longer exists.
    async fn life(&self, unit: &str) -> Result<Life, ApiError>;
}

/// Membership change stream plus the task that pumps it.
///
/// The only way to read the stream is [`register`](Self::register), which puts
/// the pump under a supervisor: its failure kills the supervisor, and stopping
/// the supervisor stops the pump.
pub struct MembersWatch {
    changes: mpsc::Receiver<Vec<String>>,
    task: TaskBox,
}

impl MembersWatch {
    pub fn new(changes: mpsc::Receiver<Vec<String>>, task: TaskBox) -> Self {
        Self { changes, task }
    }

    /// Builds a watch from a pump closure that owns the sending half.
    ///
    /// # Example
    /// ```
    /// use tokio_util::sync::CancellationToken;
    /// use unitvisor::MembersWatch;
    ///
    /// let watch = MembersWatch::from_fn("unit-watcher", 8, |ctx: CancellationToken, tx| async move {
    ///     let _ = tx.send(vec!["gitlab/0".to_string()]).await;
    ///     ctx.cancelled().await;
    ///     Ok(())
    /// });
    /// # drop(watch);
    /// ```
    pub fn from_fn<F, Fut>(name: impl Into<Cow<'static, str>>, capacity: usize, f: F) -> Self
    where
        F: FnOnce(CancellationToken, mpsc::Sender<Vec<String>>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self::new(rx, TaskFn::boxed(name, move |ctx| f(ctx, tx)))
    }

    /// Hands the pump to `sup` and returns the change stream.
    pub fn register(
        self,
        sup: &Arc<Supervisor>,
    ) -> Result<mpsc::Receiver<Vec<String>>, RuntimeError> {
        sup.add(self.task)?;
        Ok(self.changes)
    }
}
