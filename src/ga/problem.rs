//! Agenda GA problem definition.
//!
//! Bridges the string-keyed domain models to dense indices: advisors, session
//! slots, sessions and menu instances are numbered once, so genomes and
//! attendee lists hold plain `usize` values.

use std::collections::HashMap;

use log::warn;

use super::fitness::FitnessWeights;
use super::genome::Individual;
use crate::capacity::VenueRules;
use crate::models::{
    session_slots, Advisor, Room, ScheduledInstance, Session, SessionType, TimeSlot,
};
use crate::presenters::PresenterObligations;

/// Compact instance descriptor.
///
/// Extracted from `ScheduledInstance` with the effective capacity resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    /// Session index.
    pub session: usize,
    /// Session-slot index.
    pub slot: usize,
    /// Room index.
    pub room: usize,
    /// Effective seat capacity.
    pub capacity: usize,
}

/// GA problem definition for agenda assignment.
///
/// Holds the frozen menu and every lookup the operators, the repair pass and
/// the fitness evaluator need.
pub struct AgendaProblem {
    /// Rooms.
    pub rooms: Vec<Room>,
    /// Session slots in chronological order.
    pub slots: Vec<TimeSlot>,
    /// Session catalogue.
    pub sessions: Vec<Session>,
    /// Roster.
    pub advisors: Vec<Advisor>,
    /// Frozen menu.
    pub instances: Vec<InstanceInfo>,
    /// Fitness weights.
    pub weights: FitnessWeights,
    /// Thin-instance threshold for reporting.
    pub min_attendance: usize,
    by_slot: Vec<Vec<usize>>,
    by_session: Vec<Vec<usize>>,
    required: Vec<usize>,
    ranks: Vec<HashMap<usize, usize>>,
    obligations: Vec<Vec<Option<usize>>>,
    presenters: Vec<Vec<usize>>,
}

impl AgendaProblem {
    /// Creates a problem from domain models and a generated menu.
    ///
    /// Menu entries or obligations referring to unknown IDs are dropped.
    pub fn new(
        rooms: &[Room],
        slots: &[TimeSlot],
        sessions: &[Session],
        advisors: &[Advisor],
        menu: &[ScheduledInstance],
        obligations: &PresenterObligations,
        rules: &VenueRules,
    ) -> Self {
        let slots: Vec<TimeSlot> = session_slots(slots).into_iter().cloned().collect();
        let room_index: HashMap<&str, usize> =
            rooms.iter().enumerate().map(|(i, r)| (r.id.as_str(), i)).collect();
        let slot_index: HashMap<&str, usize> =
            slots.iter().enumerate().map(|(i, s)| (s.id.as_str(), i)).collect();
        let session_index: HashMap<&str, usize> =
            sessions.iter().enumerate().map(|(i, s)| (s.id.as_str(), i)).collect();
        let advisor_index: HashMap<&str, usize> =
            advisors.iter().enumerate().map(|(i, a)| (a.id.as_str(), i)).collect();

        let mut instances = Vec::with_capacity(menu.len());
        let mut lookup: HashMap<(usize, usize), usize> = HashMap::new();
        for inst in menu {
            let found = (
                session_index.get(inst.session_id.as_str()),
                slot_index.get(inst.slot_id.as_str()),
                room_index.get(inst.room_id.as_str()),
            );
            let (Some(&session), Some(&slot), Some(&room)) = found else {
                warn!(
                    "Menu entry '{}' at '{}'/'{}' references unknown data; dropped",
                    inst.session_id, inst.slot_id, inst.room_id
                );
                continue;
            };
            if lookup.contains_key(&(slot, room)) {
                warn!("Menu has two instances in room '{}' at '{}'", inst.room_id, inst.slot_id);
                continue;
            }
            let capacity = rules.capacity(&rooms[room], &sessions[session], &slots[slot]) as usize;
            lookup.insert((slot, room), instances.len());
            instances.push(InstanceInfo {
                session,
                slot,
                room,
                capacity,
            });
        }

        let mut by_slot = vec![Vec::new(); slots.len()];
        let mut by_session = vec![Vec::new(); sessions.len()];
        for (i, inst) in instances.iter().enumerate() {
            by_slot[inst.slot].push(i);
            by_session[inst.session].push(i);
        }

        let mut required: Vec<usize> = (0..sessions.len())
            .filter(|&s| sessions[s].is_required())
            .collect();
        // Plenary first, then mandatory sessions in catalogue order
        required.sort_by_key(|&s| sessions[s].session_type != SessionType::Plenary);

        let ranks = advisors
            .iter()
            .map(|a| {
                a.unique_preferences()
                    .enumerate()
                    .filter_map(|(rank, id)| session_index.get(id).map(|&s| (s, rank)))
                    .collect()
            })
            .collect();

        let mut obligation_table = vec![vec![None; slots.len()]; advisors.len()];
        let mut presenters = vec![Vec::new(); instances.len()];
        for o in obligations.iter() {
            let found = (
                advisor_index.get(o.advisor_id.as_str()),
                slot_index.get(o.slot_id.as_str()),
                room_index.get(o.room_id.as_str()),
            );
            if let (Some(&a), Some(&slot), Some(&room)) = found {
                if let Some(&i) = lookup.get(&(slot, room)) {
                    obligation_table[a][slot] = Some(i);
                    presenters[i].push(a);
                }
            }
        }

        Self {
            rooms: rooms.to_vec(),
            slots,
            sessions: sessions.to_vec(),
            advisors: advisors.to_vec(),
            instances,
            weights: FitnessWeights::default(),
            min_attendance: 0,
            by_slot,
            by_session,
            required,
            ranks,
            obligations: obligation_table,
            presenters,
        }
    }

    /// Sets fitness weights.
    pub fn with_weights(mut self, weights: FitnessWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the thin-instance threshold.
    pub fn with_min_attendance(mut self, n: usize) -> Self {
        self.min_attendance = n;
        self
    }

    /// Number of advisors.
    #[inline]
    pub fn advisor_count(&self) -> usize {
        self.advisors.len()
    }

    /// Number of session slots.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Instance descriptor.
    #[inline]
    pub fn instance(&self, i: usize) -> &InstanceInfo {
        &self.instances[i]
    }

    /// Session index of an instance.
    #[inline]
    pub fn session_of(&self, i: usize) -> usize {
        self.instances[i].session
    }

    /// Instances held in a slot.
    pub fn instances_in_slot(&self, slot: usize) -> &[usize] {
        &self.by_slot[slot]
    }

    /// Instances of a session.
    pub fn instances_of_session(&self, session: usize) -> &[usize] {
        &self.by_session[session]
    }

    /// Plenary and mandatory session indices, plenary first.
    pub fn required_sessions(&self) -> &[usize] {
        &self.required
    }

    /// Whether a session must be attended by everyone.
    #[inline]
    pub fn is_required(&self, session: usize) -> bool {
        self.sessions[session].is_required()
    }

    /// 0-based preference rank of a session for an advisor.
    #[inline]
    pub fn rank(&self, advisor: usize, session: usize) -> Option<usize> {
        self.ranks[advisor].get(&session).copied()
    }

    /// Number of ranked preferences an advisor has.
    #[inline]
    pub fn preference_count(&self, advisor: usize) -> usize {
        self.ranks[advisor].len()
    }

    /// Instance the advisor must present at in a slot.
    #[inline]
    pub fn obligation(&self, advisor: usize, slot: usize) -> Option<usize> {
        self.obligations[advisor][slot]
    }

    /// Whether the advisor presents at this instance.
    #[inline]
    pub fn is_presenter(&self, advisor: usize, instance: usize) -> bool {
        self.obligations[advisor][self.instances[instance].slot] == Some(instance)
    }

    /// Advisors presenting at an instance.
    pub fn presenters_of(&self, instance: usize) -> &[usize] {
        &self.presenters[instance]
    }

    /// Slots left for electives once every required session is attended.
    pub fn fillable_elective_slots(&self) -> usize {
        self.slot_count().saturating_sub(self.required.len())
    }

    /// Materializes an individual as domain instances.
    pub fn materialize(&self, individual: &Individual) -> Vec<ScheduledInstance> {
        self.instances
            .iter()
            .enumerate()
            .map(|(i, info)| ScheduledInstance {
                session_id: self.sessions[info.session].id.clone(),
                slot_id: self.slots[info.slot].id.clone(),
                room_id: self.rooms[info.room].id.clone(),
                attendees: individual
                    .attendees(i)
                    .iter()
                    .map(|&a| self.advisors[a].id.clone())
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenters::build_obligations;

    fn make_test_problem() -> AgendaProblem {
        let rooms = vec![Room::new("R1", 10), Room::new("R2", 20)];
        let slots = vec![
            TimeSlot::new("S2", 1).with_start_minute(700),
            TimeSlot::new("S1", 1).with_start_minute(540),
        ];
        let sessions = vec![
            Session::elective("E1").with_speakers("J. Vos"),
            Session::mandatory("M", 2),
            Session::plenary("P"),
        ];
        let advisors = vec![
            Advisor::new("A1", "J. Vos").with_preferences(["E1", "X"]),
            Advisor::new("A2", "Ann"),
        ];
        let menu = vec![
            ScheduledInstance::new("M", "S1", "R1"),
            ScheduledInstance::new("E1", "S2", "R1"),
            ScheduledInstance::new("P", "S2", "R2"),
            ScheduledInstance::new("E1", "S9", "R2"),
        ];
        let obligations = build_obligations(&sessions, &advisors, &menu);
        AgendaProblem::new(
            &rooms,
            &slots,
            &sessions,
            &advisors,
            &menu,
            &obligations,
            &VenueRules::default(),
        )
    }

    #[test]
    fn test_slots_are_chronological() {
        let p = make_test_problem();
        assert_eq!(p.slots[0].id, "S1");
        assert_eq!(p.slot_count(), 2);
    }

    #[test]
    fn test_unknown_menu_entries_dropped() {
        let p = make_test_problem();
        assert_eq!(p.instances.len(), 3);
    }

    #[test]
    fn test_capacity_resolved() {
        let p = make_test_problem();
        // Mandatory in a small room gets the overflow seats
        assert_eq!(p.instance(0).capacity, 15);
        assert_eq!(p.instance(1).capacity, 10);
    }

    #[test]
    fn test_lookups() {
        let p = make_test_problem();
        assert_eq!(p.instances_in_slot(0), &[0]);
        assert_eq!(p.instances_in_slot(1), &[1, 2]);
        assert_eq!(p.instances_of_session(0), &[1]);
        assert_eq!(p.required_sessions(), &[2, 1]);
        assert_eq!(p.rank(0, 0), Some(0));
        assert_eq!(p.preference_count(0), 1);
        assert_eq!(p.fillable_elective_slots(), 0);
    }

    #[test]
    fn test_obligations_indexed() {
        let p = make_test_problem();
        assert_eq!(p.obligation(0, 1), Some(1));
        assert_eq!(p.obligation(0, 0), None);
        assert!(p.is_presenter(0, 1));
        assert_eq!(p.presenters_of(1), &[0]);
        assert!(p.presenters_of(2).is_empty());
    }

    #[test]
    fn test_repeated_preference_keeps_first_rank() {
        let advisor: Advisor =
            serde_json::from_str(r#"{"id":"A1","name":"Ann","preferences":["E1","E2","E1"]}"#).unwrap();
        let sessions = vec![Session::elective("E1"), Session::elective("E2")];
        let p = AgendaProblem::new(
            &[Room::new("R1", 10)],
            &[TimeSlot::new("S1", 1)],
            &sessions,
            &[advisor],
            &[ScheduledInstance::new("E1", "S1", "R1")],
            &PresenterObligations::default(),
            &VenueRules::default(),
        );
        assert_eq!(p.rank(0, 0), Some(0));
        assert_eq!(p.rank(0, 1), Some(1));
        assert_eq!(p.preference_count(0), 2);
    }
}
