//! # Reconciliation loop: the main task of an application's supervisor.
//!
//! Merges the desired-state membership stream and the actual-state status
//! stream of one application into membership handoffs and status batches.
//!
//! ## Flow
//! ```text
//! run(ctx)
//!   ├─► watch_members ──► MembersWatch::register(sup)   (pump is a supervised child)
//!   ├─► deployer.start(app, MembershipSource) ──► sup.add (supervised child)
//!   └─► loop {
//!         status watch missing? ──► watch_status (gone → exit clean, error → fatal)
//!         select! {
//!           ctx.cancelled()                      ──► exit
//!           membership request (only if offer)   ──► hand off snapshot
//!           members batch                        ──► life lookups ──► offer = true
//!           status changed                       ──► list ──► dedup ──► update_units
//!           status stream ended                  ──► stop watch ──► gone? exit : restart
//!         }
//!       }
//!       stop status watch (every exit path)
//! ```
//!
//! ## Rules
//! - One event is handled completely before the next `select!`
//! - A stop request wins over every other ready event
//! - Membership is offered only after a batch; an unanswered offer stays pending
//! - Units the substrate reports as dying are never part of a status batch
//! - Status dedup compares against the last *observed* status, not the last sent

use std::sync::Arc;

use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{dedup::StatusCache, membership::LiveMembers, worker::WorkerDeps};
use crate::{
    adapters::{MembershipSource, StatusWatch},
    core::Supervisor,
    error::{ApiError, ReconcileError, TaskError},
    events::{Event, EventKind},
    model::UnitUpdate,
    policies::BackoffPolicy,
    tasks::{TaskBox, TaskFn},
};

/// Task name of the loop inside its supervisor.
pub(crate) const RECONCILE_TASK: &str = "reconcile";

pub(crate) struct Reconciler {
    application: Arc<str>,
    sup: Arc<Supervisor>,
    deps: WorkerDeps,
    resubscribe: BackoffPolicy,
}

impl Reconciler {
    pub(crate) fn new(
        application: Arc<str>,
        sup: Arc<Supervisor>,
        deps: WorkerDeps,
        resubscribe: BackoffPolicy,
    ) -> Self {
        Self {
            application,
            sup,
            deps,
            resubscribe,
        }
    }

    pub(crate) fn into_task(self) -> TaskBox {
        TaskFn::boxed(RECONCILE_TASK, move |ctx: CancellationToken| self.run(ctx))
    }

    async fn run(self, ctx: CancellationToken) -> Result<(), TaskError> {
        let app = self.application.as_ref();

        let mut members = self
            .deps
            .desired
            .watch_members(app)
            .await
            .map_err(|source| ReconcileError::WatchMembers {
                application: app.to_string(),
                source,
            })?
            .register(&self.sup)
            .map_err(ReconcileError::from)?;

        let (source, mut requests) = MembershipSource::channel();
        self.sup
            .add(self.deps.deployer.start(app, source))
            .map_err(ReconcileError::from)?;

        let mut live = LiveMembers::default();
        let mut cache = StatusCache::default();
        let mut offer = false;
        let mut restarts: u32 = 0;
        let mut status: Option<StatusWatch> = None;

        let res: Result<(), TaskError> = loop {
            if status.is_none() {
                match self.deps.actual.watch_status(app).await {
                    Ok(watch) => status = Some(watch),
                    Err(e) if self.deps.actual.is_gone(&e) => {
                        self.gone(&e);
                        break Ok(());
                    }
                    Err(source) => {
                        break Err(ReconcileError::WatchStatus {
                            application: app.to_string(),
                            source,
                        }
                        .into())
                    }
                }
            }
            let Some(watch) = status.as_mut() else {
                continue;
            };

            tokio::select! {
                // Stopping also closes the member stream; the stop must win.
                biased;

                _ = ctx.cancelled() => break Err(TaskError::Canceled),

                Some(reply) = requests.recv(), if offer => {
                    let snapshot = live.snapshot();
                    let count = snapshot.len();
                    // A dropped reply means the consumer gave up; keep offering.
                    if reply.send(snapshot).is_ok() {
                        offer = false;
                        self.publish(Event::new(EventKind::MembershipHandedOff).with_count(count));
                    }
                }

                batch = members.recv() => match batch {
                    Some(units) => {
                        if let Err(e) = self.apply_members(&mut live, units).await {
                            break Err(e.into());
                        }
                        offer = true;
                    }
                    None if ctx.is_cancelled() => break Err(TaskError::Canceled),
                    None => {
                        break Err(ReconcileError::MembersWatchClosed {
                            application: app.to_string(),
                        }
                        .into())
                    }
                },

                changed = watch.changed() => match changed {
                    Some(()) => {
                        if let Err(e) = self.report_status(&mut cache).await {
                            break Err(e.into());
                        }
                        restarts = 0;
                    }
                    None => {
                        let ended = match status.take() {
                            Some(watch) => watch.stop().await,
                            None => Ok(()),
                        };
                        match ended {
                            Err(e) if self.deps.actual.is_gone(&e) => {
                                self.gone(&e);
                                break Ok(());
                            }
                            ended => {
                                if !self.restart_pause(&ctx, restarts, ended.err()).await {
                                    break Err(TaskError::Canceled);
                                }
                                restarts = restarts.saturating_add(1);
                            }
                        }
                    }
                },
            }
        };

        if let Some(watch) = status.take() {
            if let Err(e) = watch.stop().await {
                debug!(application = %app, error = %e, "status watcher stopped with error");
            }
        }
        res
    }

    /// Looks up the life of every unit in `units` and folds it into `live`.
    async fn apply_members(
        &self,
        live: &mut LiveMembers,
        units: Vec<String>,
    ) -> Result<(), ReconcileError> {
        for unit in units {
            let life = self.deps.desired.life(&unit).await;
            if let Err(source) = live.apply(&unit, life) {
                return Err(ReconcileError::Life { unit, source });
            }
        }
        debug!(application = %self.application, members = live.len(), "live membership updated");
        self.publish(Event::new(EventKind::MembershipChanged).with_count(live.len()));
        Ok(())
    }

    /// Fetches substrate status and submits one deduplicated batch.
    async fn report_status(&self, cache: &mut StatusCache) -> Result<(), ReconcileError> {
        let app = self.application.as_ref();
        let units = self.deps.actual.list_status(app).await.map_err(|source| {
            ReconcileError::ListStatus {
                application: app.to_string(),
                source,
            }
        })?;
        debug!(application = %app, units = units.len(), "substrate units changed");

        let batch: Vec<UnitUpdate> = units
            .iter()
            .filter(|u| !u.dying)
            .map(|u| UnitUpdate::new(u, cache.report(&u.id, u.status.clone())))
            .collect();

        let mut ev = Event::new(EventKind::StatusReported).with_count(batch.len());
        match self.deps.updater.update_units(app, batch).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(application = %app, error = %e, "units no longer exist, update ignored");
                ev = ev.with_reason(e.to_string());
            }
            Err(source) => {
                return Err(ReconcileError::UpdateUnits {
                    application: app.to_string(),
                    source,
                })
            }
        }
        self.publish(ev);
        Ok(())
    }

    /// Reports a status watcher restart and waits out the backoff.
    ///
    /// Returns `false` if the stop signal fired meanwhile.
    async fn restart_pause(
        &self,
        ctx: &CancellationToken,
        attempt: u32,
        cause: Option<ApiError>,
    ) -> bool {
        let delay = self.resubscribe.next(attempt);
        let reason = cause.map_or_else(|| "status watcher closed".to_string(), |e| e.to_string());
        warn!(application = %self.application, %reason, attempt, "status watcher stopped, restarting");

        let mut ev = Event::new(EventKind::StatusWatchRestarting).with_reason(reason);
        if !delay.is_zero() {
            ev = ev.with_delay(delay);
        }
        self.publish(ev);

        if delay.is_zero() {
            return !ctx.is_cancelled();
        }
        tokio::select! {
            _ = ctx.cancelled() => false,
            _ = time::sleep(delay) => true,
        }
    }

    fn gone(&self, err: &ApiError) {
        warn!(application = %self.application, error = %err, "application removed from substrate, stopping");
        self.publish(Event::new(EventKind::ApplicationGone).with_reason(err.to_string()));
    }

    fn publish(&self, ev: Event) {
        self.sup
            .bus()
            .publish(ev.with_scope(Arc::clone(&self.application)));
    }
}
