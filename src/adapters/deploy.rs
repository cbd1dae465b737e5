//! # Deployment sub-worker contract and membership handoff.
//!
//! The deployment worker pulls live membership snapshots from the reconciler
//! through a [`MembershipSource`]. A pull is a rendezvous: the request waits
//! until the reconciler has a fresh snapshot to offer, and the reconciler only
//! answers requests while it has one.
//!
//! ```text
//! Deployer task                    Reconciler loop
//!   source.next() ── request ──►   select! { .., Some(reply) = requests.recv(), if offer => .. }
//!                 ◄── snapshot ──  reply.send(live.snapshot())
//! ```

use std::collections::BTreeSet;

use tokio::sync::{mpsc, oneshot};

use crate::tasks::TaskBox;

/// Identities of the units currently alive (or dying) for an application.
pub type Membership = BTreeSet<String>;

/// Requests for a membership snapshot, as seen by the reconciler.
pub(crate) type MembershipRequests = mpsc::Receiver<oneshot::Sender<Membership>>;

/// Starts the worker that realizes the desired replica count on the substrate.
pub trait Deployer: Send + Sync + 'static {
    /// Builds the deployment task for `application`.
    ///
    /// The task runs as a child of the application's supervisor; an error from it
    /// ends the whole application worker.
    fn start(&self, application: &str, members: MembershipSource) -> TaskBox;
}

/// Pull side of the membership handoff.
#[derive(Debug)]
pub struct MembershipSource {
    requests: mpsc::Sender<oneshot::Sender<Membership>>,
}

impl MembershipSource {
    pub(crate) fn channel() -> (Self, MembershipRequests) {
        let (tx, rx) = mpsc::channel(1);
        (Self { requests: tx }, rx)
    }

    /// Waits for the next membership snapshot.
    ///
    /// Returns `None` once the reconciler has exited.
    pub async fn next(&self) -> Option<Membership> {
        let (reply, snapshot) = oneshot::channel();
        self.requests.send(reply).await.ok()?;
        snapshot.await.ok()
    }
}
