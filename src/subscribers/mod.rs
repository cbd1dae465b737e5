//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Bus ──► supervisor listener ──► SubscriberSet::emit(&Event)
//!                                   ├──► [queue S1] ─► worker S1 ─► on_event()
//!                                   ├──► [queue S2] ─► worker S2 ─► on_event()
//!                                   └──► [queue SN] ─► worker SN ─► on_event()
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use unitvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct Alerts;
//!
//! #[async_trait]
//! impl Subscribe for Alerts {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::Terminated && event.reason.is_some() {
//!             // page someone
//!         }
//!     }
//!     fn name(&self) -> &'static str { "alerts" }
//! }
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
