//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by supervisors, the tasks they run
//! and the reconciliation loop.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor`, `core::runner::run_task`, the reconciliation
//!   loop, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the supervisor's listener (updates `AliveTracker` and fans
//!   out to `SubscriberSet`), plus anyone holding [`Supervisor::bus`](crate::Supervisor::bus).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
