//! # Unit status values.
//!
//! [`Status`] is the tag; [`StatusInfo`] adds a human-readable message and an
//! opaque key/value payload. Two `StatusInfo` values are the same report only
//! if tag, message and payload are all equal.

use std::collections::BTreeMap;
use std::fmt;

/// Status tag of a unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// Nothing new to say; also the sentinel sent for a repeated report.
    #[default]
    Unknown,
    Allocating,
    Waiting,
    Maintenance,
    Active,
    Running,
    Blocked,
    Error,
    Terminated,
}

impl Status {
    /// Stable label used on the wire by the update sink.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Unknown => "unknown",
            Status::Allocating => "allocating",
            Status::Waiting => "waiting",
            Status::Maintenance => "maintenance",
            Status::Active => "active",
            Status::Running => "running",
            Status::Blocked => "blocked",
            Status::Error => "error",
            Status::Terminated => "terminated",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status tag with its message and opaque payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusInfo {
    pub status: Status,
    pub message: String,
    pub data: BTreeMap<String, String>,
}

impl StatusInfo {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// The "unknown/unchanged" sentinel: tag `Unknown`, no message, no payload.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}
