//! # Supervisor: one failure domain with first-error-wins semantics.
//!
//! A [`Supervisor`] owns exactly one main task and any number of child tasks.
//! All of them share a stop signal; the first error from any of them becomes
//! the supervisor's terminal error, and the supervisor only becomes terminal
//! once every owned task has actually exited.
//!
//! ## Lifecycle
//! ```text
//!   build() ──► start(main) ──► running ──kill(reason) / main exits / child error──► dying
//!                  │                                                                  │
//!              add(child)* ◄────────────── (still accepted, child sees cancelled token)
//!                                                                                     ▼
//!                                                          all tasks joined ──► terminal
//!                                                                                     │
//!                                                          add(child) ──► Err(Terminated)
//! ```
//!
//! ## Rules
//! - `start` binds the main task; a second call fails with [`RuntimeError::AlreadyStarted`]
//! - `kill` before `start` still ends in terminal; a later `start` is rejected
//! - The main task exiting (for any reason) stops the supervisor
//! - A child exiting with `Ok(())` / `Canceled` does not stop the supervisor
//! - The error slot is written at most once; later errors are dropped
//! - `kill` never blocks; `wait` resolves only after every owned task is joined
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use unitvisor::{Supervisor, SupervisorConfig, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_name("demo")
//!         .build();
//!
//!     sup.start(TaskFn::boxed("main", |ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Err::<(), _>(TaskError::Canceled)
//!     }))
//!     .unwrap();
//!     sup.add(TaskFn::boxed("child", |_ctx: CancellationToken| async move {
//!         Err::<(), _>(TaskError::fail("boom"))
//!     }))
//!     .unwrap();
//!
//!     assert_eq!(sup.wait().await, Err(TaskError::fail("boom")));
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use tokio::time;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::{
    alive::AliveTracker, builder::SupervisorBuilder, config::SupervisorConfig, runner::run_task,
};
use crate::{
    error::{RuntimeError, TaskError},
    events::{Bus, Event, EventKind},
    tasks::TaskBox,
};

#[derive(Default)]
struct State {
    started: bool,
    terminal: bool,
}

/// Groups a main task and its children into a single failure domain.
pub struct Supervisor {
    name: Arc<str>,
    cfg: SupervisorConfig,
    bus: Bus,
    alive: Arc<AliveTracker>,

    /// Broadcast stop signal; every task gets a child token of it.
    stop: CancellationToken,
    /// Cancelled once the supervisor is terminal.
    done: CancellationToken,
    /// Cancelled on drop; releases the listener and the reaper.
    dropped: CancellationToken,
    tracker: TaskTracker,
    error: OnceLock<TaskError>,
    state: Mutex<State>,
}

impl Supervisor {
    /// Returns a builder for a new supervisor.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        name: Arc<str>,
        cfg: SupervisorConfig,
        bus: Bus,
        alive: Arc<AliveTracker>,
        dropped: CancellationToken,
    ) -> Self {
        Self {
            name,
            cfg,
            bus,
            alive,
            stop: CancellationToken::new(),
            done: CancellationToken::new(),
            dropped,
            tracker: TaskTracker::new(),
            error: OnceLock::new(),
            state: Mutex::new(State::default()),
        }
    }

    /// Binds and starts the main task.
    ///
    /// A supervisor killed before this call still becomes terminal once its
    /// children exit; `start` then drops `main` and returns [`RuntimeError::Terminated`].
    pub fn start(self: &Arc<Self>, main: TaskBox) -> Result<(), RuntimeError> {
        let mut st = self.lock_state();
        if st.started {
            return Err(RuntimeError::AlreadyStarted);
        }
        if st.terminal {
            drop(st);
            return Err(self.reject(main));
        }
        st.started = true;

        let me = Arc::clone(self);
        let ctx = self.stop.child_token();
        self.tracker.spawn(async move {
            let res = run_task(main, ctx, me.bus.clone(), Arc::clone(&me.name)).await;
            me.kill(res.err());
        });
        Ok(())
    }

    /// Registers a child task in this failure domain.
    ///
    /// While dying, the child still runs but with an already-cancelled token.
    /// Once terminal, the child is dropped unstarted and [`RuntimeError::Terminated`] is returned.
    pub fn add(self: &Arc<Self>, task: TaskBox) -> Result<(), RuntimeError> {
        let st = self.lock_state();
        if st.terminal {
            drop(st);
            return Err(self.reject(task));
        }

        let me = Arc::clone(self);
        let ctx = self.stop.child_token();
        self.tracker.spawn(async move {
            if let Err(e) = run_task(task, ctx, me.bus.clone(), Arc::clone(&me.name)).await {
                me.kill(Some(e));
            }
        });
        Ok(())
    }

    /// Requests the supervisor to stop; never blocks.
    ///
    /// A non-cancel `reason` is recorded if no error was recorded before.
    /// Calling it again without a new error is a no-op.
    pub fn kill(&self, reason: Option<TaskError>) {
        let recorded = {
            let st = self.lock_state();
            if st.terminal {
                return;
            }
            match reason.filter(|e| !e.is_canceled()) {
                Some(e) => self.error.set(e).is_ok(),
                None => false,
            }
        };
        if self.stop.is_cancelled() && !recorded {
            return;
        }

        let mut ev = Event::new(EventKind::StopRequested).with_scope(Arc::clone(&self.name));
        if let (true, Some(e)) = (recorded, self.error.get()) {
            ev = ev.with_reason(e.to_string());
        }
        self.bus.publish(ev);
        self.stop.cancel();
    }

    /// Waits until the supervisor is terminal and returns the recorded error, if any.
    pub async fn wait(&self) -> Result<(), TaskError> {
        self.done.cancelled().await;
        match self.error.get() {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Stops the supervisor and waits up to [`SupervisorConfig::grace`] for it to become terminal.
    ///
    /// On expiry returns [`RuntimeError::GraceExceeded`] naming the tasks still running.
    /// The terminal error itself is reported by [`wait`](Self::wait).
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.kill(None);

        let grace = self.cfg.grace;
        if time::timeout(grace, self.done.cancelled()).await.is_ok() {
            return Ok(());
        }
        let stuck = self.alive.snapshot().await;
        self.bus.publish(
            Event::new(EventKind::GraceExceeded)
                .with_scope(Arc::clone(&self.name))
                .with_delay(grace)
                .with_count(stuck.len()),
        );
        Err(RuntimeError::GraceExceeded { grace, stuck })
    }

    /// True once every owned task has exited.
    pub fn is_terminal(&self) -> bool {
        self.done.is_cancelled()
    }

    /// The error recorded so far, if any.
    pub fn err(&self) -> Option<TaskError> {
        self.error.get().cloned()
    }

    /// Sorted names of the tasks currently running (eventually consistent).
    pub async fn alive(&self) -> Vec<String> {
        self.alive.snapshot().await
    }

    /// Supervisor name (the `scope` of its events).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Event bus of this supervisor.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Spawns the task that turns the stop signal into the terminal state.
    ///
    /// It only holds a weak reference until the stop signal fires.
    pub(crate) fn spawn_reaper(self: &Arc<Self>) {
        tokio::spawn(Self::reap(
            Arc::downgrade(self),
            self.stop.clone(),
            self.dropped.clone(),
        ));
    }

    /// Joins every owned task once the stop signal fired, then marks the supervisor terminal.
    async fn reap(me: Weak<Self>, stop: CancellationToken, dropped: CancellationToken) {
        tokio::select! {
            _ = stop.cancelled() => {}
            _ = dropped.cancelled() => return,
        }
        let Some(me) = me.upgrade() else {
            return;
        };
        me.finish().await;
    }

    async fn finish(&self) {
        loop {
            self.tracker.close();
            self.tracker.wait().await;
            if self.mark_terminal() {
                break;
            }
        }

        let mut ev = Event::new(EventKind::Terminated).with_scope(Arc::clone(&self.name));
        if let Some(e) = self.error.get() {
            ev = ev.with_reason(e.to_string());
        }
        self.bus.publish(ev);
        self.done.cancel();
    }

    /// Marks terminal if no task is left; `add` checks the flag under the same lock.
    fn mark_terminal(&self) -> bool {
        let mut st = self.lock_state();
        if self.tracker.is_empty() {
            st.terminal = true;
            true
        } else {
            false
        }
    }

    /// Drops a task that arrived after the supervisor became terminal.
    fn reject(&self, task: TaskBox) -> RuntimeError {
        let name = task.name().to_string();
        drop(task);
        self.bus.publish(
            Event::new(EventKind::TaskRejected)
                .with_scope(Arc::clone(&self.name))
                .with_task(name.as_str()),
        );
        RuntimeError::Terminated { task: name }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.stop.cancel();
        self.dropped.cancel();
    }
}
