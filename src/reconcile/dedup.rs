use std::collections::HashMap;

use crate::model::StatusInfo;

/// Last observed status per substrate unit.
///
/// A status identical to the previous observation is reported as
/// [`StatusInfo::unknown`]; the cache always keeps the observed value.
#[derive(Debug, Default)]
pub(crate) struct StatusCache {
    last: HashMap<String, StatusInfo>,
}

impl StatusCache {
    /// Records `observed` for `provider_id` and returns the status to report.
    pub(crate) fn report(&mut self, provider_id: &str, observed: StatusInfo) -> StatusInfo {
        let send = match self.last.get(provider_id) {
            Some(prev) if *prev == observed => StatusInfo::unknown(),
            _ => observed.clone(),
        };
        self.last.insert(provider_id.to_string(), observed);
        send
    }
}
