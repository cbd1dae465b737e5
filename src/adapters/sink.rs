use async_trait::async_trait;

use crate::{error::ApiError, model::UnitUpdate};

/// Outbound sink for per-unit status, address and port updates.
#[async_trait]
pub trait UnitUpdater: Send + Sync + 'static {
    /// Submits one batch for `application`.
    ///
    /// [`ApiError::NotFound`] means the application or a unit was removed concurrently.
    async fn update_units(&self, application: &str, units: Vec<UnitUpdate>)
        -> Result<(), ApiError>;
}
