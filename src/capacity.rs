//! Effective seat capacity.
//!
//! The nominal room capacity is adjusted by venue rules, applied in order,
//! first match wins:
//!
//! 1. The plenary room hosts only the plenary (large fixed capacity), every
//!    other session gets 0.
//! 2. Rooms closed on day 2 have capacity 0 in every day-2 slot.
//! 3. Mandatory sessions may over-pack small rooms: a room at or below the
//!    small-room threshold offers `threshold + overflow_delta` seats.
//! 4. Otherwise the nominal capacity.
//!
//! Every capacity check in the crate goes through [`VenueRules::capacity`].

use serde::{Deserialize, Serialize};

use crate::models::{Room, Session, SessionType, TimeSlot};

/// Venue-specific capacity exceptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueRules {
    /// Room reserved for the plenary. `None` disables rule 1.
    pub plenary_room: Option<String>,
    /// Seats offered to the plenary in the plenary room.
    pub plenary_capacity: u32,
    /// Rooms unavailable on day 2.
    pub closed_on_day_two: Vec<String>,
    /// Rooms with at most this many seats count as small.
    pub small_room_threshold: u32,
    /// Extra seats mandatory sessions get in small rooms, above the threshold.
    pub overflow_delta: u32,
}

impl Default for VenueRules {
    fn default() -> Self {
        Self {
            plenary_room: None,
            plenary_capacity: 1000,
            closed_on_day_two: Vec::new(),
            small_room_threshold: 12,
            overflow_delta: 3,
        }
    }
}

impl VenueRules {
    /// Sets the plenary room.
    pub fn with_plenary_room(mut self, room_id: impl Into<String>) -> Self {
        self.plenary_room = Some(room_id.into());
        self
    }

    /// Sets the plenary seat count.
    pub fn with_plenary_capacity(mut self, seats: u32) -> Self {
        self.plenary_capacity = seats;
        self
    }

    /// Closes a room on day 2.
    pub fn with_closed_on_day_two(mut self, room_id: impl Into<String>) -> Self {
        self.closed_on_day_two.push(room_id.into());
        self
    }

    /// Sets the small-room threshold and the mandatory overflow delta.
    pub fn with_small_room_overflow(mut self, threshold: u32, delta: u32) -> Self {
        self.small_room_threshold = threshold;
        self.overflow_delta = delta;
        self
    }

    /// Effective capacity of `room` when hosting `session` at `slot`.
    pub fn capacity(&self, room: &Room, session: &Session, slot: &TimeSlot) -> u32 {
        if self.plenary_room.as_deref() == Some(room.id.as_str()) {
            return if session.session_type == SessionType::Plenary {
                self.plenary_capacity
            } else {
                0
            };
        }
        if slot.day == 2 && self.closed_on_day_two.iter().any(|r| r == &room.id) {
            return 0;
        }
        if session.session_type == SessionType::Mandatory
            && room.capacity <= self.small_room_threshold
        {
            return self.small_room_threshold + self.overflow_delta;
        }
        room.capacity
    }
}
