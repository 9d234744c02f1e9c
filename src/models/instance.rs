//! Scheduled instances and externally fixed placements.

use serde::{Deserialize, Serialize};

/// A concrete occurrence of a session in a room at a slot.
///
/// Created once by the master schedule; afterwards only `attendees` changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstance {
    /// Session held.
    pub session_id: String,
    /// Slot it is held in.
    pub slot_id: String,
    /// Room it is held in.
    pub room_id: String,
    /// Attending advisor IDs (presenters included).
    pub attendees: Vec<String>,
}

impl ScheduledInstance {
    /// Creates an instance with no attendees.
    pub fn new(
        session_id: impl Into<String>,
        slot_id: impl Into<String>,
        room_id: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            slot_id: slot_id.into(),
            room_id: room_id.into(),
            attendees: Vec::new(),
        }
    }

    /// Number of listed attendees.
    #[inline]
    pub fn attendee_count(&self) -> usize {
        self.attendees.len()
    }
}

/// A placement decided outside the engine and loaded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPlacement {
    /// Session to place.
    pub session_id: String,
    /// Room to use.
    pub room_id: String,
    /// Slot to use.
    pub slot_id: String,
}

impl FixedPlacement {
    /// Creates a fixed placement.
    pub fn new(
        session_id: impl Into<String>,
        room_id: impl Into<String>,
        slot_id: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            room_id: room_id.into(),
            slot_id: slot_id.into(),
        }
    }
}
