//! Runtime core: the supervision unit.
//!
//! The public API from this module is [`Supervisor`] (one failure domain),
//! [`SupervisorBuilder`] and [`SupervisorConfig`].
//!
//! Internal modules:
//! - [`runner`]: drives one task to completion and publishes its lifecycle events;
//! - [`supervisor`]: first-error-wins failure domain with guaranteed teardown;
//! - [`alive`]: sequence-checked tracker of running task names;
//! - [`builder`]: wires bus, subscribers and the event listener.

mod alive;
mod builder;
mod config;
mod runner;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use supervisor::Supervisor;

pub(crate) use runner::panic_message;
