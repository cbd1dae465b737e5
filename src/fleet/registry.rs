//! # Application registry: one worker per provisioned application.
//!
//! ## Rules
//! - `ensure` starts a worker unless a live one is already registered;
//!   a terminal worker is replaced
//! - `remove` takes the worker out first, then stops and joins it outside the lock
//! - `stop_all` kills every worker before joining any of them

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::{
    error::{RuntimeError, TaskError},
    reconcile::{ApplicationWorker, ReconcileConfig, WorkerDeps},
    subscribers::Subscribe,
};

/// Registry of running [`ApplicationWorker`]s keyed by application name.
pub struct ApplicationRegistry {
    deps: WorkerDeps,
    cfg: ReconcileConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
    workers: RwLock<HashMap<String, ApplicationWorker>>,
}

impl ApplicationRegistry {
    pub fn new(deps: WorkerDeps, cfg: ReconcileConfig) -> Self {
        Self {
            deps,
            cfg,
            subscribers: Vec::new(),
            workers: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribers attached to every worker started from now on.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Makes sure a live worker exists for `application`.
    ///
    /// Returns `true` if a worker was started.
    pub async fn ensure(&self, application: &str) -> Result<bool, RuntimeError> {
        let mut workers = self.workers.write().await;
        if let Some(existing) = workers.get(application) {
            if !existing.is_terminal() {
                return Ok(false);
            }
            debug!(application, "replacing terminated worker");
        }

        let worker = ApplicationWorker::start(
            application,
            self.deps.clone(),
            self.cfg.clone(),
            self.subscribers.clone(),
        )?;
        workers.insert(application.to_string(), worker);
        info!(application, "application worker started");
        Ok(true)
    }

    /// Stops and joins the worker of `application`.
    ///
    /// Returns its terminal result, or `None` if nothing was registered.
    pub async fn remove(&self, application: &str) -> Option<Result<(), TaskError>> {
        let worker = self.workers.write().await.remove(application)?;
        let res = worker.stop().await;
        report(application, &res);
        Some(res)
    }

    /// Sorted names of the registered applications.
    pub async fn list(&self) -> Vec<String> {
        let workers = self.workers.read().await;
        let mut names: Vec<String> = workers.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Names of registered applications whose worker already finished.
    pub async fn terminated(&self) -> Vec<String> {
        let workers = self.workers.read().await;
        let mut names: Vec<String> = workers
            .iter()
            .filter(|(_, w)| w.is_terminal())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Stops every worker and returns their terminal results, sorted by name.
    pub async fn stop_all(&self) -> Vec<(String, Result<(), TaskError>)> {
        let mut drained: Vec<(String, ApplicationWorker)> = {
            let mut workers = self.workers.write().await;
            workers.drain().collect()
        };
        drained.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        for (_, worker) in &drained {
            worker.kill();
        }

        let mut results = Vec::with_capacity(drained.len());
        for (name, worker) in drained {
            let res = worker.wait().await;
            report(&name, &res);
            results.push((name, res));
        }
        results
    }
}

fn report(application: &str, res: &Result<(), TaskError>) {
    match res {
        Ok(()) => info!(application, "application worker stopped"),
        Err(e) => warn!(application, error = %e, label = e.as_label(), "application worker failed"),
    }
}
