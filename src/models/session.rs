//! Session model.
//!
//! A session is one entry of the conference catalogue. Its type and repeat
//! count drive how many instances the master schedule creates.

use serde::{Deserialize, Serialize};

use super::{DayPeriod, TimeSlot};

/// Attendance classification of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    /// Single all-hands session in the plenary room.
    Plenary,
    /// Every advisor attends exactly once; repeated for capacity.
    Mandatory,
    /// Chosen through ranked preferences.
    Elective,
}

/// A catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Free-text speaker field, possibly several names ("A. Smith & B. Jones").
    pub speakers: String,
    /// Attendance classification.
    pub session_type: SessionType,
    /// Number of instances to schedule (electives: lower bound).
    pub repeats: u32,
    /// Restricts placement to one day.
    pub day: Option<u8>,
    /// Restricts placement to one half of the day.
    pub period: Option<DayPeriod>,
}

impl Session {
    fn with_type(id: impl Into<String>, session_type: SessionType, repeats: u32) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            speakers: String::new(),
            session_type,
            repeats,
            day: None,
            period: None,
        }
    }

    /// Creates the plenary session.
    pub fn plenary(id: impl Into<String>) -> Self {
        Self::with_type(id, SessionType::Plenary, 1)
    }

    /// Creates a mandatory session repeated `repeats` times.
    pub fn mandatory(id: impl Into<String>, repeats: u32) -> Self {
        Self::with_type(id, SessionType::Mandatory, repeats)
    }

    /// Creates an elective session with one instance.
    pub fn elective(id: impl Into<String>) -> Self {
        Self::with_type(id, SessionType::Elective, 1)
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the free-text speaker field.
    pub fn with_speakers(mut self, speakers: impl Into<String>) -> Self {
        self.speakers = speakers.into();
        self
    }

    /// Sets the repeat count.
    pub fn with_repeats(mut self, repeats: u32) -> Self {
        self.repeats = repeats;
        self
    }

    /// Restricts placement to a day.
    pub fn with_day(mut self, day: u8) -> Self {
        self.day = Some(day);
        self
    }

    /// Restricts placement to a half day.
    pub fn with_period(mut self, period: DayPeriod) -> Self {
        self.period = Some(period);
        self
    }

    /// Whether every advisor must attend (plenary or mandatory).
    #[inline]
    pub fn is_required(&self) -> bool {
        matches!(
            self.session_type,
            SessionType::Plenary | SessionType::Mandatory
        )
    }

    /// Whether the day/period constraints allow placement in `slot`.
    pub fn allows_slot(&self, slot: &TimeSlot) -> bool {
        self.day.is_none_or(|d| d == slot.day)
            && self.period.is_none_or(|p| p == slot.period())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_types() {
        assert!(Session::plenary("P").is_required());
        assert!(Session::mandatory("M", 3).is_required());
        assert!(!Session::elective("E").is_required());
    }

    #[test]
    fn test_allows_slot() {
        let morning_day2 = TimeSlot::new("S", 2).with_start_minute(600);
        let afternoon_day2 = TimeSlot::new("S", 2).with_start_minute(840);
        let s = Session::elective("E").with_day(2).with_period(DayPeriod::Morning);
        assert!(s.allows_slot(&morning_day2));
        assert!(!s.allows_slot(&afternoon_day2));
        assert!(!s.allows_slot(&TimeSlot::new("S", 1)));
        assert!(Session::elective("F").allows_slot(&afternoon_day2));
    }
}
