//! Bookkeeping of the application workers a provisioner runs.

mod registry;

pub use registry::ApplicationRegistry;
