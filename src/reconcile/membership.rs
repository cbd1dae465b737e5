use std::collections::BTreeSet;

use crate::{adapters::Membership, error::ApiError, model::Life};

/// Identities the control plane currently considers alive or dying.
#[derive(Debug, Default)]
pub(crate) struct LiveMembers {
    alive: BTreeSet<String>,
}

impl LiveMembers {
    /// Applies the outcome of one life lookup.
    ///
    /// Not-found and `Dead` remove the unit; any other life adds it.
    /// Other lookup errors are handed back untouched.
    pub(crate) fn apply(&mut self, unit: &str, life: Result<Life, ApiError>) -> Result<(), ApiError> {
        match life {
            Ok(life) if !life.is_dead() => {
                if !self.alive.contains(unit) {
                    self.alive.insert(unit.to_string());
                }
            }
            Ok(_) => {
                self.alive.remove(unit);
            }
            Err(e) if e.is_not_found() => {
                self.alive.remove(unit);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Membership {
        self.alive.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.alive.len()
    }
}
