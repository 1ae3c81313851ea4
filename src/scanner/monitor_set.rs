//! Every monitor ever seen by a scan
//!
//! The set only grows. A monitor whose last file is deleted stays listed
//! until the process restarts.

use std::collections::HashSet;
use std::sync::RwLock;

use crate::record::MonitorIdentity;

#[derive(Debug, Default)]
pub struct MonitorSet {
    monitors: RwLock<HashSet<MonitorIdentity>>,
}

impl MonitorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation. Returns `true` if the monitor is new.
    ///
    /// An identity already present is kept as first seen, location details
    /// included.
    pub fn add(&self, monitor: MonitorIdentity) -> bool {
        {
            let monitors = self.monitors.read().unwrap_or_else(|p| p.into_inner());
            if monitors.contains(&monitor) {
                return false;
            }
        }
        self.monitors
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(monitor)
    }

    /// Copy of the current contents, in no particular order
    pub fn snapshot(&self) -> Vec<MonitorIdentity> {
        self.monitors
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn contains(&self, monitor: &MonitorIdentity) -> bool {
        self.monitors
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains(monitor)
    }

    pub fn len(&self) -> usize {
        self.monitors.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
