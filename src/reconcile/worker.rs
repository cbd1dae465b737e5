//! # ApplicationWorker: handle to one application's supervised reconciliation.
//!
//! ## Example
//! ```no_run
//! use unitvisor::{ApplicationWorker, LogWriter, ReconcileConfig, Subscribe, WorkerDeps};
//! use std::sync::Arc;
//!
//! async fn provision(deps: WorkerDeps) -> Result<(), Box<dyn std::error::Error>> {
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let worker = ApplicationWorker::start("gitlab", deps, ReconcileConfig::default(), subs)?;
//!
//!     // ... the application gets removed from the control plane
//!     worker.stop().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use super::{config::ReconcileConfig, reconciler::Reconciler};
use crate::{
    adapters::{ActualState, Deployer, DesiredState, UnitUpdater},
    core::Supervisor,
    error::{RuntimeError, TaskError},
    subscribers::Subscribe,
};

/// Collaborators of one application worker.
#[derive(Clone)]
pub struct WorkerDeps {
    pub desired: Arc<dyn DesiredState>,
    pub actual: Arc<dyn ActualState>,
    pub updater: Arc<dyn UnitUpdater>,
    pub deployer: Arc<dyn Deployer>,
}

/// A running reconciliation loop for one application, with its own supervisor.
///
/// The loop is the supervisor's main task; the desired-state watcher and the
/// deployment worker are its children.
pub struct ApplicationWorker {
    application: Arc<str>,
    sup: Arc<Supervisor>,
}

impl ApplicationWorker {
    /// Builds the application's supervisor and starts the loop under it.
    pub fn start(
        application: impl Into<Arc<str>>,
        deps: WorkerDeps,
        cfg: ReconcileConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Result<Self, RuntimeError> {
        let application = application.into();
        let sup = Supervisor::builder(cfg.supervisor)
            .with_name(Arc::clone(&application))
            .with_subscribers(subscribers)
            .build();

        let reconciler = Reconciler::new(
            Arc::clone(&application),
            Arc::clone(&sup),
            deps,
            cfg.resubscribe,
        );
        sup.start(reconciler.into_task())?;
        Ok(Self { application, sup })
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    /// Asks the worker to stop; never blocks.
    pub fn kill(&self) {
        self.sup.kill(None);
    }

    /// Waits for the worker to finish and returns its terminal error, if any.
    pub async fn wait(&self) -> Result<(), TaskError> {
        self.sup.wait().await
    }

    /// [`kill`](Self::kill) followed by [`wait`](Self::wait).
    pub async fn stop(&self) -> Result<(), TaskError> {
        self.kill();
        self.wait().await
    }

    /// Stops the worker, waiting at most the configured grace period.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.sup.shutdown().await
    }

    pub fn is_terminal(&self) -> bool {
        self.sup.is_terminal()
    }

    /// The supervisor owning the loop and its children.
    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.sup
    }
}
