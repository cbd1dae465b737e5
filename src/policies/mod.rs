//! Re-subscription pacing.
//!
//! The reconciliation loop re-subscribes to the substrate status watcher as soon
//! as it ends. A caller that wants pacing layers it on through [`BackoffPolicy`];
//! the default used by [`ReconcileConfig`](crate::ReconcileConfig) is
//! [`BackoffPolicy::none`], i.e. no delay at all.
//!
//! ## Contents
//! - [`BackoffPolicy`] how delays evolve across consecutive restarts (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization to avoid every application reconnecting in lockstep

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
