use std::collections::BTreeMap;

use super::status::{Status, StatusInfo};

/// One unit as reported by the substrate's bulk status fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubstrateUnit {
    /// Substrate-assigned identity (pod name, container id, ...).
    pub id: String,
    /// Control-plane unit identity; empty until the substrate unit is matched to one.
    pub unit: String,
    pub address: String,
    pub ports: Vec<String>,
    /// The substrate is already tearing this unit down.
    pub dying: bool,
    pub status: StatusInfo,
}

/// One record of the batch submitted to the update sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitUpdate {
    pub unit: String,
    pub provider_id: String,
    pub address: String,
    pub ports: Vec<String>,
    pub status: Status,
    pub message: String,
    pub data: BTreeMap<String, String>,
}

impl UnitUpdate {
    /// Builds the record for `unit`, reporting `status` (which may be the sentinel).
    pub fn new(unit: &SubstrateUnit, status: StatusInfo) -> Self {
        Self {
            unit: unit.unit.clone(),
            provider_id: unit.id.clone(),
            address: unit.address.clone(),
            ports: unit.ports.clone(),
            status: status.status,
            message: status.message,
            data: status.data,
        }
    }

    /// Wire label of the reported status.
    pub fn label(&self) -> &'static str {
        self.status.as_str()
    }
}
