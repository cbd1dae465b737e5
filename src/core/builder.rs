use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use super::{alive::AliveTracker, config::SupervisorConfig, supervisor::Supervisor};
use crate::{
    events::{Bus, Event, EventKind},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Supervisor`].
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    name: Arc<str>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            name: Arc::from("supervisor"),
            subscribers: Vec::new(),
        }
    }

    /// Names the supervisor; every event it publishes carries this as `scope`.
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the supervisor and starts its event listener and reaper.
    ///
    /// Both background tasks exit once the supervisor is terminal or dropped.
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let alive = Arc::new(AliveTracker::new());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let dropped = CancellationToken::new();

        spawn_listener(
            bus.subscribe(),
            Arc::clone(&alive),
            subs,
            Arc::clone(&self.name),
            dropped.clone(),
        );
        let sup = Arc::new(Supervisor::new_internal(
            self.name, self.cfg, bus, alive, dropped,
        ));
        sup.spawn_reaper();
        sup
    }
}

/// Forwards bus events to the alive tracker and the subscriber set.
///
/// Exits after forwarding the supervisor's own `Terminated` event, or once the
/// supervisor is dropped, then drains subscribers.
fn spawn_listener(
    mut rx: broadcast::Receiver<Event>,
    alive: Arc<AliveTracker>,
    subs: SubscriberSet,
    scope: Arc<str>,
    dropped: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                biased;
                msg = rx.recv() => msg,
                _ = dropped.cancelled() => break,
            };
            match msg {
                Ok(ev) => {
                    alive.update(&ev).await;
                    subs.emit(&ev);
                    if ev.kind == EventKind::Terminated && ev.scope.as_deref() == Some(&*scope) {
                        break;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        subs.shutdown().await;
    });
}
