//! Room model.

use serde::{Deserialize, Serialize};

/// A physical room with a nominal seat capacity.
///
/// The nominal capacity is never used directly for feasibility checks; the
/// effective capacity comes from [`crate::capacity::VenueRules::capacity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Nominal seat count.
    pub capacity: u32,
}

impl Room {
    /// Creates a room with the given nominal capacity.
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            capacity,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_defaults_name_to_id() {
        let r = Room::new("R1", 40);
        assert_eq!(r.name, "R1");
        assert_eq!(r.capacity, 40);
        assert_eq!(r.with_name("Blue Hall").name, "Blue Hall");
    }
}
