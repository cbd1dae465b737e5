//! Error types used by the supervision runtime, the reconciliation loop and its collaborators.
//!
//! This module defines four enums:
//!
//! - [`RuntimeError`]: errors raised by a [`Supervisor`](crate::Supervisor) itself.
//! - [`TaskError`]: errors returned by supervised tasks and reported by `Supervisor::wait`.
//! - [`ApiError`]: errors returned by external collaborators (control plane, substrate).
//! - [`ReconcileError`]: fatal causes raised by the reconciliation loop.
//!
//! All of them provide `as_label` for logs/metrics. They are `Clone` because the
//! recorded terminal error of a supervisor is handed out to every waiter.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the supervision runtime.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// A main task was already bound to this supervisor.
    #[error("supervisor already started")]
    AlreadyStarted,

    /// The supervisor is terminal; the task was dropped without running.
    #[error("supervisor is terminal; task {task:?} was not started")]
    Terminated {
        /// Name of the rejected task.
        task: String,
    },

    /// Shutdown grace period was exceeded; some tasks were still running.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the tasks that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use unitvisor::RuntimeError;
    ///
    /// assert_eq!(RuntimeError::AlreadyStarted.as_label(), "runtime_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::Terminated { .. } => "runtime_terminated",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors returned by external collaborators.
///
/// Collaborators only need to tell "not found" apart from everything else;
/// the reconciliation loop treats the two very differently.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The addressed entity (unit, application) does not exist.
    #[error("{what} not found")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// Any other failure.
    #[error("{message}")]
    Other {
        /// The underlying error message.
        message: String,
    },
}

impl ApiError {
    /// Shorthand for [`ApiError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound { what: what.into() }
    }

    /// Shorthand for [`ApiError::Other`].
    pub fn other(message: impl Into<String>) -> Self {
        ApiError::Other {
            message: message.into(),
        }
    }

    /// True for [`ApiError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ApiError::NotFound { .. } => "api_not_found",
            ApiError::Other { .. } => "api_other",
        }
    }
}

/// # Fatal causes raised by the reconciliation loop.
///
/// Each one ends the application's supervisor with itself as the recorded error.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Subscribing to desired-state membership changes failed.
    #[error("watching units of {application:?}: {source}")]
    WatchMembers {
        application: String,
        #[source]
        source: ApiError,
    },

    /// The desired-state watcher closed its channel.
    #[error("unit watcher for {application:?} closed channel")]
    MembersWatchClosed { application: String },

    /// Life lookup failed with something other than "not found".
    #[error("reading life of unit {unit:?}: {source}")]
    Life {
        unit: String,
        #[source]
        source: ApiError,
    },

    /// Subscribing to substrate status changes failed (and the application is not gone).
    #[error("failed to start unit watcher for {application:?}: {source}")]
    WatchStatus {
        application: String,
        #[source]
        source: ApiError,
    },

    /// Fetching substrate unit status failed.
    #[error("listing substrate units of {application:?}: {source}")]
    ListStatus {
        application: String,
        #[source]
        source: ApiError,
    },

    /// Submitting unit updates failed with something other than "not found".
    #[error("updating units of {application:?}: {source}")]
    UpdateUnits {
        application: String,
        #[source]
        source: ApiError,
    },

    /// The owning supervisor refused a task.
    #[error(transparent)]
    Supervisor(#[from] RuntimeError),
}

impl ReconcileError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ReconcileError::WatchMembers { .. } => "reconcile_watch_members",
            ReconcileError::MembersWatchClosed { .. } => "reconcile_members_watch_closed",
            ReconcileError::Life { .. } => "reconcile_life",
            ReconcileError::WatchStatus { .. } => "reconcile_watch_status",
            ReconcileError::ListStatus { .. } => "reconcile_list_status",
            ReconcileError::UpdateUnits { .. } => "reconcile_update_units",
            ReconcileError::Supervisor(_) => "reconcile_supervisor",
        }
    }
}

/// # Errors produced by task execution.
///
/// Any error other than [`TaskError::Canceled`] is fatal to the task's supervisor.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The reconciliation loop hit a fatal condition.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Task observed cancellation and exited; not an error for the supervisor.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use unitvisor::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Reconcile(e) => e.as_label(),
            TaskError::Canceled => "task_canceled",
        }
    }

    /// True if this outcome counts as a clean exit for the supervisor.
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }
}
