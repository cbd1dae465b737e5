//! # Actual-state (substrate) contract.
//!
//! The substrate connection is expected to drop now and then. A [`StatusWatch`]
//! is therefore not supervised: its holder notices the stream end, collects the
//! pump's error with [`StatusWatch::stop`], and decides between re-subscribing
//! and giving up via [`ActualState::is_gone`].

use std::future::Future;

use async_trait::async_trait;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{error::ApiError, model::SubstrateUnit};

/// Substrate view of an application's units.
#[async_trait]
pub trait ActualState: Send + Sync + 'static {
    /// Subscribes to "status changed" notifications for `application`.
    async fn watch_status(&self, application: &str) -> Result<StatusWatch, ApiError>;

    /// Fetches the current status of every unit of `application`, in substrate order.
    async fn list_status(&self, application: &str) -> Result<Vec<SubstrateUnit>, ApiError>;

    /// True if `err` means the application's substrate resource no longer exists.
    ///
    /// Error signatures are substrate specific, so each adapter supplies its own predicate.
    fn is_gone(&self, err: &ApiError) -> bool;
}

/// Notification stream backed by a pump task the watch owns.
///
/// Dropping the watch cancels the pump; [`stop`](Self::stop) also joins it.
pub struct StatusWatch {
    changes: mpsc::Receiver<()>,
    stop: CancellationToken,
    pump: Option<JoinHandle<Result<(), ApiError>>>,
}

impl StatusWatch {
    /// Spawns `f` as the pump. It should return when `ctx` is cancelled, and
    /// return `Err` when the underlying subscription breaks.
    ///
    /// Notifications carry no payload; pumps may coalesce with `try_send`.
    pub fn spawn<F, Fut>(capacity: usize, f: F) -> Self
    where
        F: FnOnce(CancellationToken, mpsc::Sender<()>) -> Fut,
        Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stop = CancellationToken::new();
        let pump = tokio::spawn(f(stop.child_token(), tx));
        Self {
            changes: rx,
            stop,
            pump: Some(pump),
        }
    }

    /// Waits for the next notification; `None` once the pump has ended.
    pub async fn changed(&mut self) -> Option<()> {
        self.changes.recv().await
    }

    /// Stops the pump, waits for it and returns how it ended.
    pub async fn stop(mut self) -> Result<(), ApiError> {
        self.stop.cancel();
        match self.pump.take() {
            Some(pump) => pump
                .await
                .unwrap_or_else(|e| Err(ApiError::other(format!("status watcher died: {e}")))),
            None => Ok(()),
        }
    }
}

impl Drop for StatusWatch {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}
