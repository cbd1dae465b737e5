//! # Per-application worker configuration.

use crate::{core::SupervisorConfig, policies::BackoffPolicy};

/// Configuration for one [`ApplicationWorker`](crate::ApplicationWorker).
///
/// ## Field semantics
/// - `resubscribe`: pacing between consecutive actual-state re-subscriptions;
///   the default never waits
/// - `supervisor`: settings of the application's supervisor
#[derive(Clone, Debug)]
pub struct ReconcileConfig {
    /// Delay policy applied before re-subscribing to actual-state status.
    ///
    /// The attempt counter resets once a notification has been processed.
    pub resubscribe: BackoffPolicy,

    /// Supervisor settings (shutdown grace, bus capacity).
    pub supervisor: SupervisorConfig,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            resubscribe: BackoffPolicy::none(),
            supervisor: SupervisorConfig::default(),
        }
    }
}
