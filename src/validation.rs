//! Input validation for agenda problems.
//!
//! Checks structural integrity of rooms, slots, sessions and advisors before
//! placement. Detects:
//! - Duplicate IDs
//! - References to unknown sessions, rooms or slots
//! - Fixed placements outside session slots
//! - More than one plenary session
//! - Days outside the two-day grid
//! - Missing rooms, session slots or advisors
//!
//! Every problem is collected; nothing stops at the first error.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capacity::VenueRules;
use crate::models::{Advisor, FixedPlacement, Room, Session, SessionType, TimeSlot};
use crate::placement::PlacementConfig;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two entities of one kind share the same ID.
    DuplicateId,
    /// A session ID that is not in the catalogue.
    UnknownSessionReference,
    /// A room ID that is not in the venue.
    UnknownRoomReference,
    /// A slot ID that is not in the grid.
    UnknownSlotReference,
    /// A placement targets a break, meal or other non-session slot.
    NonSessionSlot,
    /// More than one plenary session.
    MultiplePlenaries,
    /// Day number outside 1..=2.
    InvalidDay,
    /// No rooms, no session slots or no advisors.
    EmptyInput,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

fn check_unique<'a>(
    kind: &str,
    ids: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {kind} ID: {id}"),
            ));
        }
    }
    seen
}

/// Validates the input data for an agenda problem.
///
/// Checks:
/// 1. No duplicate room, slot, session or advisor IDs
/// 2. At least one room, one session slot and one advisor
/// 3. Slot and session days lie in 1..=2
/// 4. At most one plenary session
/// 5. Advisor preferences name known sessions
/// 6. Fixed placements name a known session, room and session slot
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    rooms: &[Room],
    slots: &[TimeSlot],
    sessions: &[Session],
    advisors: &[Advisor],
    fixed: &[FixedPlacement],
) -> ValidationResult {
    let mut errors = Vec::new();

    let room_ids = check_unique("room", rooms.iter().map(|r| r.id.as_str()), &mut errors);
    let slot_ids = check_unique("slot", slots.iter().map(|s| s.id.as_str()), &mut errors);
    let session_ids = check_unique("session", sessions.iter().map(|s| s.id.as_str()), &mut errors);
    check_unique("advisor", advisors.iter().map(|a| a.id.as_str()), &mut errors);

    if rooms.is_empty() {
        errors.push(ValidationError::new(ValidationErrorKind::EmptyInput, "No rooms"));
    }
    if !slots.iter().any(TimeSlot::is_session) {
        errors.push(ValidationError::new(ValidationErrorKind::EmptyInput, "No session slots"));
    }
    if advisors.is_empty() {
        errors.push(ValidationError::new(ValidationErrorKind::EmptyInput, "No advisors"));
    }

    for slot in slots.iter().filter(|s| !(1..=2).contains(&s.day)) {
        errors.push(ValidationError::new(
            ValidationErrorKind::InvalidDay,
            format!("Slot '{}' is on day {}", slot.id, slot.day),
        ));
    }
    for session in sessions {
        if let Some(day) = session.day.filter(|d| !(1..=2).contains(d)) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDay,
                format!("Session '{}' is restricted to day {day}", session.id),
            ));
        }
    }

    let plenaries = sessions
        .iter()
        .filter(|s| s.session_type == SessionType::Plenary)
        .count();
    if plenaries > 1 {
        errors.push(ValidationError::new(
            ValidationErrorKind::MultiplePlenaries,
            format!("{plenaries} plenary sessions; at most one is allowed"),
        ));
    }

    for advisor in advisors {
        for pref in &advisor.preferences {
            if !session_ids.contains(pref.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownSessionReference,
                    format!("Advisor '{}' prefers unknown session '{}'", advisor.id, pref),
                ));
            }
        }
    }

    for f in fixed {
        if !session_ids.contains(f.session_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownSessionReference,
                format!("Fixed placement references unknown session '{}'", f.session_id),
            ));
        }
        if !room_ids.contains(f.room_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownRoomReference,
                format!("Fixed placement of '{}' references unknown room '{}'", f.session_id, f.room_id),
            ));
        }
        if !slot_ids.contains(f.slot_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownSlotReference,
                format!("Fixed placement of '{}' references unknown slot '{}'", f.session_id, f.slot_id),
            ));
        } else if slots.iter().any(|s| s.id == f.slot_id && !s.is_session()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonSessionSlot,
                format!("Fixed placement of '{}' targets non-session slot '{}'", f.session_id, f.slot_id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates that venue rules and placement settings name existing rooms and
/// session slots.
pub fn validate_venue(
    rules: &VenueRules,
    placement: &PlacementConfig,
    rooms: &[Room],
    slots: &[TimeSlot],
) -> ValidationResult {
    let mut errors = Vec::new();
    let known_room = |id: &str| rooms.iter().any(|r| r.id == id);

    let named_rooms = rules.plenary_room.iter().chain(&rules.closed_on_day_two);
    for id in named_rooms.filter(|id| !known_room(id)) {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnknownRoomReference,
            format!("Venue rules reference unknown room '{id}'"),
        ));
    }

    if let Some(id) = &placement.plenary_slot {
        match slots.iter().find(|s| &s.id == id) {
            None => errors.push(ValidationError::new(
                ValidationErrorKind::UnknownSlotReference,
                format!("Plenary slot '{id}' does not exist"),
            )),
            Some(slot) if !slot.is_session() => errors.push(ValidationError::new(
                ValidationErrorKind::NonSessionSlot,
                format!("Plenary slot '{id}' is not a session slot"),
            )),
            Some(_) => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlotKind;

    fn sample_rooms() -> Vec<Room> {
        vec![Room::new("AULA", 200), Room::new("R1", 12)]
    }

    fn sample_slots() -> Vec<TimeSlot> {
        vec![
            TimeSlot::new("S1", 1),
            TimeSlot::new("LUNCH", 1).with_kind(SlotKind::Meal).with_start_minute(720),
            TimeSlot::new("S2", 2),
        ]
    }

    fn sample_sessions() -> Vec<Session> {
        vec![
            Session::plenary("P"),
            Session::mandatory("M", 2),
            Session::elective("E1"),
        ]
    }

    fn sample_advisors() -> Vec<Advisor> {
        vec![Advisor::new("A1", "Ann").with_preferences(["E1"])]
    }

    #[test]
    fn test_valid_input() {
        let fixed = vec![FixedPlacement::new("E1", "R1", "S2")];
        assert!(validate_input(
            &sample_rooms(),
            &sample_slots(),
            &sample_sessions(),
            &sample_advisors(),
            &fixed
        )
        .is_ok());
    }

    #[test]
    fn test_duplicate_room_id() {
        let rooms = vec![Room::new("R1", 10), Room::new("R1", 20)];
        let errors = validate_input(&rooms, &sample_slots(), &sample_sessions(), &sample_advisors(), &[])
            .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId && e.message.contains("room")));
    }

    #[test]
    fn test_empty_input() {
        let errors = validate_input(&[], &[], &[], &[], &[]).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::EmptyInput)
                .count(),
            3
        );
    }

    #[test]
    fn test_multiple_plenaries() {
        let mut sessions = sample_sessions();
        sessions.push(Session::plenary("P2"));
        let errors = validate_input(&sample_rooms(), &sample_slots(), &sessions, &sample_advisors(), &[])
            .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::MultiplePlenaries));
    }

    #[test]
    fn test_invalid_day() {
        let mut slots = sample_slots();
        slots.push(TimeSlot::new("S3", 3));
        let mut sessions = sample_sessions();
        sessions.push(Session::elective("E2").with_day(0));
        let errors = validate_input(&sample_rooms(), &slots, &sessions, &sample_advisors(), &[])
            .unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::InvalidDay)
                .count(),
            2
        );
    }

    #[test]
    fn test_unknown_preference() {
        let advisors = vec![Advisor::new("A1", "Ann").with_preferences(["E9"])];
        let errors = validate_input(&sample_rooms(), &sample_slots(), &sample_sessions(), &advisors, &[])
            .unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::UnknownSessionReference));
    }

    #[test]
    fn test_fixed_placement_references() {
        let fixed = vec![
            FixedPlacement::new("E9", "R9", "S9"),
            FixedPlacement::new("E1", "R1", "LUNCH"),
        ];
        let errors = validate_input(
            &sample_rooms(),
            &sample_slots(),
            &sample_sessions(),
            &sample_advisors(),
            &fixed,
        )
        .unwrap_err();
        let kinds: Vec<_> = errors.iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&ValidationErrorKind::UnknownSessionReference));
        assert!(kinds.contains(&ValidationErrorKind::UnknownRoomReference));
        assert!(kinds.contains(&ValidationErrorKind::UnknownSlotReference));
        assert!(kinds.contains(&ValidationErrorKind::NonSessionSlot));
    }

    #[test]
    fn test_venue_references() {
        let rules = VenueRules::default()
            .with_plenary_room("AULA")
            .with_closed_on_day_two("ATTIC");
        let placement = PlacementConfig::default().with_plenary_slot("LUNCH");
        let errors = validate_venue(&rules, &placement, &sample_rooms(), &sample_slots()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].kind, ValidationErrorKind::UnknownRoomReference);
        assert_eq!(errors[1].kind, ValidationErrorKind::NonSessionSlot);

        let ok = VenueRules::default().with_plenary_room("AULA");
        assert!(validate_venue(&ok, &PlacementConfig::default(), &sample_rooms(), &sample_slots()).is_ok());
    }
}
