//! Per-application reconciliation: the loop, its private state and the worker handle.
//!
//! - [`ApplicationWorker`] starts one supervisor per application with the loop as main task
//! - [`WorkerDeps`] bundles the collaborators the loop talks to
//! - [`ReconcileConfig`] carries supervisor settings and re-subscription pacing

mod config;
mod dedup;
mod membership;
mod reconciler;
mod worker;

#[cfg(test)]
mod tests;

pub use config::ReconcileConfig;
pub use worker::{ApplicationWorker, WorkerDeps};
