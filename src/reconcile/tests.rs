use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use super::{ApplicationWorker, ReconcileConfig, WorkerDeps};
use crate::{
    adapters::{
        ActualState, Deployer, DesiredState, MembersWatch, Membership, MembershipSource,
        StatusWatch, UnitUpdater,
    },
    error::{ApiError, ReconcileError, TaskError},
    events::{Event, EventKind},
    model::{Life, Status, StatusInfo, SubstrateUnit, UnitUpdate},
    policies::{BackoffPolicy, JitterPolicy},
    tasks::{TaskBox, TaskFn},
};

const GONE: &str = "unexpected EOF";

struct FakeDesired {
    lives: Mutex<HashMap<String, Result<Life, ApiError>>>,
    feed: Mutex<Option<mpsc::UnboundedReceiver<Vec<String>>>>,
    closed: Arc<AtomicBool>,
}

impl FakeDesired {
    fn set_life(&self, unit: &str, life: Result<Life, ApiError>) {
        self.lives.lock().unwrap().insert(unit.to_string(), life);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DesiredState for FakeDesired {
    async fn watch_members(&self, _application: &str) -> Result<MembersWatch, ApiError> {
        let feed = self.feed.lock().unwrap().take();
        let mut feed = feed.ok_or_else(|| ApiError::other("already watching"))?;
        let closed = Arc::clone(&self.closed);

        Ok(MembersWatch::from_fn(
            "unit-watcher",
            1,
            move |ctx: CancellationToken, tx| async move {
                loop {
                    tokio::select! {
                        _ = ctx.cancelled() => break,
                        batch = feed.recv() => match batch {
                            Some(batch) => {
                                if tx.send(batch).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        },
                    }
                }
                closed.store(true, Ordering::SeqCst);
                Ok(())
            },
        ))
    }

    async fn life(&self, unit: &str) -> Result<Life, ApiError> {
        let lives = self.lives.lock().unwrap();
        match lives.get(unit) {
            Some(life) => life.clone(),
            None => Err(ApiError::not_found(format!("unit {unit}"))),
        }
    }
}

struct FakeActual {
    feed: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<(), ApiError>>>>,
    units: Mutex<Vec<SubstrateUnit>>,
    subscribe_errors: Mutex<VecDeque<ApiError>>,
    subscriptions: AtomicUsize,
    pumps: Arc<AtomicUsize>,
}

impl FakeActual {
    fn set_units(&self, units: Vec<SubstrateUnit>) {
        *self.units.lock().unwrap() = units;
    }

    fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    fn pumps(&self) -> usize {
        self.pumps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ActualState for FakeActual {
    async fn watch_status(&self, _application: &str) -> Result<StatusWatch, ApiError> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let failure = self.subscribe_errors.lock().unwrap().pop_front();
        if let Some(e) = failure {
            return Err(e);
        }

        let feed = Arc::clone(&self.feed);
        let pumps = Arc::clone(&self.pumps);
        pumps.fetch_add(1, Ordering::SeqCst);

        Ok(StatusWatch::spawn(1, move |ctx, tx| async move {
            let res = async {
                let mut feed = feed.lock().await;
                loop {
                    tokio::select! {
                        _ = ctx.cancelled() => return Ok(()),
                        ev = feed.recv() => match ev {
                            Some(Ok(())) => {
                                if tx.send(()).await.is_err() {
                                    return Ok(());
                                }
                            }
                            Some(Err(e)) => return Err(e),
                            None => return Ok(()),
                        },
                    }
                }
            }
            .await;
            pumps.fetch_sub(1, Ordering::SeqCst);
            res
        }))
    }

    async fn list_status(&self, _application: &str) -> Result<Vec<SubstrateUnit>, ApiError> {
        Ok(self.units.lock().unwrap().clone())
    }

    fn is_gone(&self, err: &ApiError) -> bool {
        matches!(err, ApiError::Other { message } if message.contains(GONE))
    }
}

struct FakeUpdater {
    sent: mpsc::UnboundedSender<Vec<UnitUpdate>>,
    results: Mutex<VecDeque<Result<(), ApiError>>>,
    latency: Mutex<Duration>,
}

impl FakeUpdater {
    fn fail_next(&self, err: ApiError) {
        self.results.lock().unwrap().push_back(Err(err));
    }

    fn slow_down(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }
}

#[async_trait]
impl UnitUpdater for FakeUpdater {
    async fn update_units(
        &self,
        _application: &str,
        units: Vec<UnitUpdate>,
    ) -> Result<(), ApiError> {
        let _ = self.sent.send(units);
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

struct FakeDeployer {
    snapshots: mpsc::UnboundedSender<Membership>,
    fail: CancellationToken,
}

impl Deployer for FakeDeployer {
    fn start(&self, _application: &str, members: MembershipSource) -> TaskBox {
        let snapshots = self.snapshots.clone();
        let fail = self.fail.clone();
        TaskFn::boxed("deployment", move |ctx: CancellationToken| async move {
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => return Ok(()),
                    _ = fail.cancelled() => return Err(TaskError::fail("scaling failed")),
                    next = members.next() => match next {
                        Some(members) => {
                            let _ = snapshots.send(members);
                        }
                        None => return Ok(()),
                    },
                }
            }
        })
    }
}

struct Harness {
    desired: Arc<FakeDesired>,
    actual: Arc<FakeActual>,
    updater: Arc<FakeUpdater>,
    deployer: Arc<FakeDeployer>,
    members: Option<mpsc::UnboundedSender<Vec<String>>>,
    status: mpsc::UnboundedSender<Result<(), ApiError>>,
    updates: mpsc::UnboundedReceiver<Vec<UnitUpdate>>,
    snapshots: mpsc::UnboundedReceiver<Membership>,
}

impl Harness {
    fn new() -> Self {
        let (members_tx, members_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = mpsc::unbounded_channel();

        Self {
            desired: Arc::new(FakeDesired {
                lives: Mutex::new(HashMap::new()),
                feed: Mutex::new(Some(members_rx)),
                closed: Arc::new(AtomicBool::new(false)),
            }),
            actual: Arc::new(FakeActual {
                feed: Arc::new(tokio::sync::Mutex::new(status_rx)),
                units: Mutex::new(Vec::new()),
                subscribe_errors: Mutex::new(VecDeque::new()),
                subscriptions: AtomicUsize::new(0),
                pumps: Arc::new(AtomicUsize::new(0)),
            }),
            updater: Arc::new(FakeUpdater {
                sent: updates_tx,
                results: Mutex::new(VecDeque::new()),
                latency: Mutex::new(Duration::ZERO),
            }),
            deployer: Arc::new(FakeDeployer {
                snapshots: snapshots_tx,
                fail: CancellationToken::new(),
            }),
            members: Some(members_tx),
            status: status_tx,
            updates: updates_rx,
            snapshots: snapshots_rx,
        }
    }

    fn start(&self) -> ApplicationWorker {
        self.start_with(ReconcileConfig::default())
    }

    fn start_with(&self, cfg: ReconcileConfig) -> ApplicationWorker {
        let deps = WorkerDeps {
            desired: self.desired.clone(),
            actual: self.actual.clone(),
            updater: self.updater.clone(),
            deployer: self.deployer.clone(),
        };
        ApplicationWorker::start("gitlab", deps, cfg, Vec::new()).unwrap()
    }

    fn batch(&self, units: &[&str]) {
        let batch = units.iter().map(|u| u.to_string()).collect();
        self.members.as_ref().unwrap().send(batch).unwrap();
    }

    fn notify(&self) {
        self.status.send(Ok(())).unwrap();
    }

    fn break_status(&self, err: ApiError) {
        self.status.send(Err(err)).unwrap();
    }

    async fn next_update(&mut self) -> Vec<UnitUpdate> {
        within(self.updates.recv()).await.expect("updater dropped")
    }

    async fn next_snapshot(&mut self) -> Vec<String> {
        let snapshot = within(self.snapshots.recv()).await.expect("deployer dropped");
        snapshot.into_iter().collect()
    }
}

async fn within<F: Future>(fut: F) -> F::Output {
    timeout(Duration::from_secs(5), fut).await.expect("timed out")
}

async fn wait_for(events: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
    within(async {
        loop {
            match events.recv().await {
                Ok(ev) if ev.kind == kind => return ev,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("bus closed"),
            }
        }
    })
    .await
}

fn pod(id: &str, unit: &str, status: StatusInfo) -> SubstrateUnit {
    SubstrateUnit {
        id: id.to_string(),
        unit: unit.to_string(),
        address: "10.0.0.7".to_string(),
        ports: vec!["80/TCP".to_string()],
        dying: false,
        status,
    }
}

#[tokio::test]
async fn test_membership_follows_life() {
    let mut h = Harness::new();
    h.desired.set_life("gitlab/0", Ok(Life::Alive));
    let worker = h.start();

    h.batch(&["gitlab/0"]);
    assert_eq!(h.next_snapshot().await, ["gitlab/0"]);

    h.desired.set_life("gitlab/0", Ok(Life::Dead));
    h.batch(&["gitlab/0"]);
    assert!(h.next_snapshot().await.is_empty());

    assert_eq!(worker.stop().await, Ok(()));
}

#[tokio::test]
async fn test_dying_members_stay_and_missing_ones_go() {
    let mut h = Harness::new();
    h.desired.set_life("gitlab/0", Ok(Life::Alive));
    h.desired.set_life("gitlab/1", Ok(Life::Dying));
    let worker = h.start();

    h.batch(&["gitlab/0", "gitlab/1", "gitlab/2"]);
    assert_eq!(h.next_snapshot().await, ["gitlab/0", "gitlab/1"]);

    h.desired.set_life("gitlab/1", Ok(Life::Dead));
    h.batch(&["gitlab/1"]);
    assert_eq!(h.next_snapshot().await, ["gitlab/0"]);

    assert_eq!(worker.stop().await, Ok(()));
}

#[tokio::test]
async fn test_membership_is_offered_only_after_a_batch() {
    let mut h = Harness::new();
    let worker = h.start();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.snapshots.try_recv().is_err());

    h.batch(&[]);
    assert!(h.next_snapshot().await.is_empty());

    assert_eq!(worker.stop().await, Ok(()));
}

#[tokio::test]
async fn test_life_lookup_error_is_fatal() {
    let h = Harness::new();
    h.desired
        .set_life("gitlab/0", Err(ApiError::other("connection refused")));
    let worker = h.start();

    h.batch(&["gitlab/0"]);
    let res = within(worker.wait()).await;
    assert_eq!(
        res,
        Err(TaskError::Reconcile(ReconcileError::Life {
            unit: "gitlab/0".into(),
            source: ApiError::other("connection refused"),
        }))
    );
    assert!(h.desired.is_closed());
    assert_eq!(h.actual.pumps(), 0);
}

#[tokio::test]
async fn test_repeated_status_is_sent_as_unknown() {
    let mut h = Harness::new();
    h.actual.set_units(vec![pod(
        "gitlab-0",
        "gitlab/0",
        StatusInfo::new(Status::Running).with_message("ready"),
    )]);
    let worker = h.start();

    h.notify();
    let first = h.next_update().await;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].status, Status::Running);
    assert_eq!(first[0].message, "ready");
    assert_eq!(first[0].provider_id, "gitlab-0");
    assert_eq!(first[0].ports, ["80/TCP"]);

    h.notify();
    let second = h.next_update().await;
    assert_eq!(second[0].status, Status::Unknown);
    assert_eq!(second[0].message, "");
    assert_eq!(second[0].address, "10.0.0.7");

    h.actual
        .set_units(vec![pod("gitlab-0", "gitlab/0", StatusInfo::new(Status::Error))]);
    h.notify();
    assert_eq!(h.next_update().await[0].status, Status::Error);

    assert_eq!(worker.stop().await, Ok(()));
}

#[tokio::test]
async fn test_dying_substrate_units_are_never_reported() {
    let mut h = Harness::new();
    let mut leaving = pod("gitlab-1", "gitlab/1", StatusInfo::new(Status::Running));
    leaving.dying = true;
    h.actual.set_units(vec![
        pod("gitlab-0", "gitlab/0", StatusInfo::new(Status::Running)),
        leaving,
        pod("gitlab-2", "gitlab/2", StatusInfo::new(Status::Waiting)),
    ]);
    let worker = h.start();

    h.notify();
    let batch = h.next_update().await;
    let ids: Vec<&str> = batch.iter().map(|u| u.provider_id.as_str()).collect();
    assert_eq!(ids, ["gitlab-0", "gitlab-2"]);

    assert_eq!(worker.stop().await, Ok(()));
}

#[tokio::test]
async fn test_sink_not_found_is_tolerated() {
    let mut h = Harness::new();
    h.actual
        .set_units(vec![pod("gitlab-0", "gitlab/0", StatusInfo::new(Status::Active))]);
    h.updater.fail_next(ApiError::not_found("application gitlab"));
    let worker = h.start();

    h.notify();
    h.next_update().await;
    h.notify();
    h.next_update().await;

    assert!(!worker.is_terminal());
    assert_eq!(worker.stop().await, Ok(()));
}

#[tokio::test]
async fn test_sink_error_is_fatal() {
    let mut h = Harness::new();
    h.updater.fail_next(ApiError::other("boom"));
    let worker = h.start();

    h.notify();
    h.next_update().await;
    assert_eq!(
        within(worker.wait()).await,
        Err(TaskError::Reconcile(ReconcileError::UpdateUnits {
            application: "gitlab".into(),
            source: ApiError::other("boom"),
        }))
    );
    assert!(h.desired.is_closed());
}

#[tokio::test]
async fn test_transient_status_error_resubscribes() {
    let mut h = Harness::new();
    h.actual
        .set_units(vec![pod("gitlab-0", "gitlab/0", StatusInfo::new(Status::Active))]);
    let worker = h.start();

    h.break_status(ApiError::other("connection reset by peer"));
    h.notify();
    assert_eq!(h.next_update().await[0].status, Status::Active);
    assert_eq!(h.actual.subscriptions(), 2);
    assert_eq!(h.actual.pumps(), 1);

    assert_eq!(worker.stop().await, Ok(()));
    assert_eq!(h.actual.pumps(), 0);
}

#[tokio::test]
async fn test_gone_status_stream_is_clean_exit() {
    let h = Harness::new();
    let worker = h.start();

    h.break_status(ApiError::other(format!("watching pods: {GONE}")));
    assert_eq!(within(worker.wait()).await, Ok(()));
    assert_eq!(h.actual.subscriptions(), 1);
    assert!(h.desired.is_closed());
}

#[tokio::test]
async fn test_gone_on_subscribe_is_clean_exit() {
    let h = Harness::new();
    h.actual
        .subscribe_errors
        .lock()
        .unwrap()
        .push_back(ApiError::other(GONE));
    let worker = h.start();

    assert_eq!(within(worker.wait()).await, Ok(()));
    assert!(h.desired.is_closed());
}

#[tokio::test]
async fn test_subscribe_error_is_fatal() {
    let h = Harness::new();
    h.actual
        .subscribe_errors
        .lock()
        .unwrap()
        .push_back(ApiError::other("forbidden"));
    let worker = h.start();

    assert_eq!(
        within(worker.wait()).await,
        Err(TaskError::Reconcile(ReconcileError::WatchStatus {
            application: "gitlab".into(),
            source: ApiError::other("forbidden"),
        }))
    );
}

#[tokio::test]
async fn test_deployment_failure_stops_everything() {
    let h = Harness::new();
    let worker = h.start();

    h.deployer.fail.cancel();
    assert_eq!(
        within(worker.wait()).await,
        Err(TaskError::fail("scaling failed"))
    );
    assert!(h.desired.is_closed());
    assert_eq!(h.actual.pumps(), 0);
}

#[tokio::test]
async fn test_closed_member_stream_is_fatal() {
    let mut h = Harness::new();
    let worker = h.start();

    h.members.take();
    assert_eq!(
        within(worker.wait()).await,
        Err(TaskError::Reconcile(ReconcileError::MembersWatchClosed {
            application: "gitlab".into(),
        }))
    );
}

#[tokio::test]
async fn test_resubscribe_waits_for_backoff() {
    let mut h = Harness::new();
    let cfg = ReconcileConfig {
        resubscribe: BackoffPolicy {
            first: Duration::from_millis(20),
            max: Duration::from_millis(20),
            factor: 1.0,
            jitter: JitterPolicy::None,
        },
        ..ReconcileConfig::default()
    };
    let worker = h.start_with(cfg);
    let mut events = worker.supervisor().bus().subscribe();

    h.break_status(ApiError::other("connection reset by peer"));
    let ev = wait_for(&mut events, EventKind::StatusWatchRestarting).await;
    assert_eq!(ev.delay_ms, Some(20));
    assert_eq!(ev.scope.as_deref(), Some("gitlab"));
    assert_eq!(ev.reason.as_deref(), Some("connection reset by peer"));

    h.notify();
    h.next_update().await;
    assert_eq!(h.actual.subscriptions(), 2);

    assert_eq!(worker.stop().await, Ok(()));
}

#[tokio::test]
async fn test_stop_interrupts_backoff() {
    let h = Harness::new();
    let cfg = ReconcileConfig {
        resubscribe: BackoffPolicy {
            first: Duration::from_secs(60),
            max: Duration::from_secs(60),
            factor: 1.0,
            jitter: JitterPolicy::None,
        },
        ..ReconcileConfig::default()
    };
    let worker = h.start_with(cfg);
    let mut events = worker.supervisor().bus().subscribe();

    h.break_status(ApiError::other("connection reset by peer"));
    wait_for(&mut events, EventKind::StatusWatchRestarting).await;

    assert_eq!(within(worker.stop()).await, Ok(()));
    assert_eq!(h.actual.subscriptions(), 1);
}

#[tokio::test]
async fn test_stop_closes_both_watchers() {
    let mut h = Harness::new();
    let worker = h.start();

    h.notify();
    assert!(h.next_update().await.is_empty());
    assert_eq!(h.actual.pumps(), 1);

    assert_eq!(within(worker.stop()).await, Ok(()));
    assert_eq!(h.actual.pumps(), 0);
    assert!(h.desired.is_closed());
    assert!(worker.is_terminal());
}

#[tokio::test]
async fn test_stop_during_slow_update_is_clean() {
    for _ in 0..5 {
        let mut h = Harness::new();
        h.actual
            .set_units(vec![pod("gitlab-0", "gitlab/0", StatusInfo::new(Status::Active))]);
        h.updater.slow_down(Duration::from_millis(40));
        let worker = h.start();

        h.notify();
        // The sink has the batch and is still busy with it.
        h.next_update().await;

        assert_eq!(within(worker.stop()).await, Ok(()));
        assert!(h.desired.is_closed());
        assert_eq!(h.actual.pumps(), 0);
    }
}
