//! Data model shared by the reconciliation loop and its collaborators.
//!
//! - [`Life`]: monotonic life cycle of a unit as the control plane sees it
//! - [`Status`], [`StatusInfo`]: tagged status with message and opaque payload
//! - [`SubstrateUnit`]: one unit as reported by the execution substrate
//! - [`UnitUpdate`]: one record of a batch submitted to the update sink

mod life;
mod status;
mod unit;

pub use life::Life;
pub use status::{Status, StatusInfo};
pub use unit::{SubstrateUnit, UnitUpdate};
