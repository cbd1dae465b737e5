//! # unitvisor
//!
//! **Unitvisor** keeps the units of a deployed application converged between a
//! control plane (desired membership and life) and an execution substrate
//! (actual status, addresses and ports).
//!
//! Each application gets its own [`Supervisor`]: a failure domain in which the
//! first error of any task wins, every task is stopped, and the supervisor only
//! reports terminal once all of them have exited.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  DesiredState                ActualState                  UnitUpdater
//!  (control plane)             (substrate)                  (control plane)
//!        │ MembersWatch              │ StatusWatch                ▲
//!        │ (supervised pump)         │ (owned, restartable)       │ batches
//!        ▼                           ▼                            │
//! ┌───────────────────────────────────────────────────────────────┴───┐
//! │  Supervisor "gitlab"                                              │
//! │   main:  reconcile loop  ── LiveMembers, StatusCache              │
//! │   child: unit-watcher pump                                        │
//! │   child: deployment (Deployer task) ◄── MembershipSource::next()  │
//! │   Bus ──► listener ──► AliveTracker + SubscriberSet ──► LogWriter │
//! └───────────────────────────────────────────────────────────────────┘
//!        ▲
//!        │ ensure / remove / stop_all
//!  ApplicationRegistry (one ApplicationWorker per application)
//! ```
//!
//! ### Lifecycle
//! ```text
//! ApplicationWorker::start ──► Supervisor::start(reconcile)
//!   ├─► register unit watcher (child)
//!   ├─► add deployment task (child)
//!   └─► loop until:
//!         - kill() / stop()                 ─► clean exit
//!         - substrate reports app gone      ─► clean exit
//!         - member stream closed            ─► ReconcileError::MembersWatchClosed
//!         - lookup / list / update failure  ─► ReconcileError::*
//!         - any child fails                 ─► that child's error
//!   every exit ─► all tasks joined ─► Terminated ─► wait() returns
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                                 |
//! |-------------------|-------------------------------------------------------------|----------------------------------------------------|
//! | **Supervision**   | First-error-wins failure domain with guaranteed teardown.   | [`Supervisor`], [`SupervisorBuilder`]              |
//! | **Reconciliation**| Per-application loop merging desired and actual state.      | [`ApplicationWorker`], [`WorkerDeps`]              |
//! | **Collaborators** | Contracts of the control plane, substrate and deployer.     | [`DesiredState`], [`ActualState`], [`Deployer`]    |
//! | **Fleet**         | One worker per provisioned application.                     | [`ApplicationRegistry`]                            |
//! | **Subscriber API**| Hook into runtime events (logging, metrics, alerts).        | [`Subscribe`], [`LogWriter`]                       |
//! | **Policies**      | Optional pacing of status watcher re-subscriptions.         | [`BackoffPolicy`], [`JitterPolicy`]                |
//! | **Errors**        | Typed errors for runtime, tasks, loop and collaborators.    | [`TaskError`], [`ReconcileError`], [`ApiError`]    |
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use unitvisor::{Supervisor, SupervisorConfig, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_name("hello")
//!         .build();
//!
//!     sup.start(TaskFn::boxed("hello", |ctx: CancellationToken| async move {
//!         if ctx.is_cancelled() {
//!             return Err(TaskError::Canceled);
//!         }
//!         println!("Hello from task!");
//!         Ok(())
//!     }))?;
//!
//!     // The main task returning stops the supervisor.
//!     sup.wait().await?;
//!     Ok(())
//! }
//! ```
mod adapters;
mod core;
mod error;
mod events;
mod fleet;
mod model;
mod policies;
mod reconcile;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use adapters::{
    ActualState, Deployer, DesiredState, MembersWatch, Membership, MembershipSource, StatusWatch,
    UnitUpdater,
};
pub use crate::core::{Supervisor, SupervisorBuilder, SupervisorConfig};
pub use error::{ApiError, ReconcileError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use fleet::ApplicationRegistry;
pub use model::{Life, Status, StatusInfo, SubstrateUnit, UnitUpdate};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use reconcile::{ApplicationWorker, ReconcileConfig, WorkerDeps};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use tasks::{BoxTaskFuture, Task, TaskBox, TaskFn};
