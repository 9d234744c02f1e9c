//! Master schedule placement.
//!
//! Decides, once per run, which session occupies which room at which slot.
//! The resulting menu of instances is frozen afterwards: the search only moves
//! advisors between instances, it never creates or removes them.
//!
//! # Algorithm
//!
//! 1. Load fixed placements verbatim.
//! 2. Put the plenary in the plenary room at the designated early slot.
//! 3. Spread mandatory repeats round-robin over day-1 slots, largest rooms first.
//! 4. Give electives instance quotas proportional to preference demand and
//!    spread each elective over distinct slots.
//! 5. Top up slots whose elective seats or variety fall short of the expected
//!    elective load.
//!
//! Room order is shuffled among equally sized rooms, so different seeds yield
//! different menus.

mod demand;
mod generator;

pub use demand::{preference_weight, session_demand};
pub use generator::MasterScheduleGenerator;

use serde::{Deserialize, Serialize};

/// Placement tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Slot reserved for the plenary. `None` = earliest day-1 session slot.
    pub plenary_slot: Option<String>,
    /// Seat over-provisioning factor for electives (>= 1.0).
    pub over_provision: f64,
    /// Non-empty instances with fewer attendees than this are thin and get
    /// backfilled or emptied by repair.
    pub min_attendance: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            plenary_slot: None,
            over_provision: 1.2,
            min_attendance: 3,
        }
    }
}

impl PlacementConfig {
    /// Sets the plenary slot.
    pub fn with_plenary_slot(mut self, slot_id: impl Into<String>) -> Self {
        self.plenary_slot = Some(slot_id.into());
        self
    }

    /// Sets the over-provisioning factor.
    pub fn with_over_provision(mut self, factor: f64) -> Self {
        self.over_provision = factor.max(1.0);
        self
    }

    /// Sets the thin-instance threshold.
    pub fn with_min_attendance(mut self, n: usize) -> Self {
        self.min_attendance = n;
        self
    }
}
