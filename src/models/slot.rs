//! Time slot model.
//!
//! The agenda spans two days. Only `SlotKind::Session` slots take part in
//! optimization; breaks and meals are carried for completeness.

use serde::{Deserialize, Serialize};

/// Classification of a program block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKind {
    /// Attendable session block.
    Session,
    /// Coffee break.
    Break,
    /// Lunch or dinner.
    Meal,
    /// Anything else (registration, travel, ...).
    Other,
}

/// Half of a day, used for session time-of-day constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayPeriod {
    /// Starts before noon.
    Morning,
    /// Starts at or after noon.
    Afternoon,
}

/// A block in the two-day grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Unique slot identifier.
    pub id: String,
    /// Day number (1 or 2).
    pub day: u8,
    /// Display label, e.g. "Tue 09:30".
    pub label: String,
    /// Block classification.
    pub kind: SlotKind,
    /// Start time in minutes after midnight.
    pub start_minute: u32,
}

impl TimeSlot {
    /// Creates a session slot on the given day starting at 09:00.
    pub fn new(id: impl Into<String>, day: u8) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            day,
            kind: SlotKind::Session,
            start_minute: 9 * 60,
        }
    }

    /// Sets the display label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the slot kind.
    pub fn with_kind(mut self, kind: SlotKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the start time in minutes after midnight.
    pub fn with_start_minute(mut self, minute: u32) -> Self {
        self.start_minute = minute;
        self
    }

    /// Whether the slot participates in optimization.
    #[inline]
    pub fn is_session(&self) -> bool {
        self.kind == SlotKind::Session
    }

    /// Morning or afternoon, split at 12:00.
    pub fn period(&self) -> DayPeriod {
        if self.start_minute < 12 * 60 {
            DayPeriod::Morning
        } else {
            DayPeriod::Afternoon
        }
    }
}

/// Session slots in chronological order (day, then start time).
pub fn session_slots(slots: &[TimeSlot]) -> Vec<&TimeSlot> {
    let mut out: Vec<&TimeSlot> = slots.iter().filter(|s| s.is_session()).collect();
    out.sort_by_key(|s| (s.day, s.start_minute));
    out
}
