//! Contracts of the collaborators the reconciliation loop consumes.
//!
//! ```text
//!   control plane                         substrate
//!   ┌───────────────┐                     ┌───────────────┐
//!   │ DesiredState  │ MembersWatch        │ ActualState   │ StatusWatch
//!   │ (life lookup) │ (supervised)        │ (bulk status) │ (owned by loop, restartable)
//!   └──────┬────────┘                     └──────┬────────┘
//!          ▼                                     ▼
//!      ┌────────────────────── Reconciler ──────────────────────┐
//!      │ live membership ──► MembershipSource ──► Deployer task │
//!      │ status batches  ──► UnitUpdater                        │
//!      └────────────────────────────────────────────────────────┘
//! ```
//!
//! The two watchers have different failure policies, so they are different types:
//! a [`MembersWatch`] can only be consumed by handing its pump to a supervisor
//! (its death is fatal), while a [`StatusWatch`] runs on its own and is stopped
//! and replaced by whoever holds it.

mod actual;
mod deploy;
mod desired;
mod sink;

pub use actual::{ActualState, StatusWatch};
pub use deploy::{Deployer, Membership, MembershipSource};
pub use desired::{DesiredState, MembersWatch};
pub use sink::UnitUpdater;
