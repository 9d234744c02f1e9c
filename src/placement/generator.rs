//! Master schedule generator.

use std::collections::{HashMap, HashSet};

use log::{info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use super::{session_demand, PlacementConfig};
use crate::capacity::VenueRules;
use crate::models::{
    session_slots, Advisor, FixedPlacement, Room, ScheduledInstance, Session, SessionType,
    TimeSlot,
};

/// Builds the frozen menu of attendable instances.
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
/// use u_agenda::capacity::VenueRules;
/// use u_agenda::models::{Room, Session, TimeSlot};
/// use u_agenda::placement::{MasterScheduleGenerator, PlacementConfig};
///
/// let rooms = vec![Room::new("R1", 20)];
/// let slots = vec![TimeSlot::new("S1", 1)];
/// let sessions = vec![Session::mandatory("M", 1)];
/// let rules = VenueRules::default();
/// let config = PlacementConfig::default();
/// let generator = MasterScheduleGenerator::new(&rooms, &slots, &sessions, &[], &rules, &config);
/// let menu = generator.generate(&[], &mut SmallRng::seed_from_u64(1));
/// assert_eq!(menu.len(), 1);
/// ```
pub struct MasterScheduleGenerator<'a> {
    rooms: &'a [Room],
    slots: Vec<&'a TimeSlot>,
    sessions: &'a [Session],
    advisors: &'a [Advisor],
    rules: &'a VenueRules,
    config: &'a PlacementConfig,
}

/// Placements made so far, as (session, slot, room) indices.
#[derive(Default)]
struct Menu {
    placements: Vec<(usize, usize, usize)>,
    used: HashSet<(usize, usize)>,
}

impl Menu {
    fn place(&mut self, session: usize, slot: usize, room: usize) {
        self.used.insert((slot, room));
        self.placements.push((session, slot, room));
    }

    fn is_free(&self, slot: usize, room: usize) -> bool {
        !self.used.contains(&(slot, room))
    }

    fn count(&self, session: usize) -> usize {
        self.placements.iter().filter(|p| p.0 == session).count()
    }

    fn count_in_slot(&self, session: usize, slot: usize) -> usize {
        self.placements
            .iter()
            .filter(|p| p.0 == session && p.1 == slot)
            .count()
    }

    fn load(&self, slot: usize) -> usize {
        self.placements.iter().filter(|p| p.1 == slot).count()
    }
}

impl<'a> MasterScheduleGenerator<'a> {
    /// Creates a generator. Non-session slots are ignored.
    pub fn new(
        rooms: &'a [Room],
        slots: &'a [TimeSlot],
        sessions: &'a [Session],
        advisors: &'a [Advisor],
        rules: &'a VenueRules,
        config: &'a PlacementConfig,
    ) -> Self {
        Self {
            rooms,
            slots: session_slots(slots),
            sessions,
            advisors,
            rules,
            config,
        }
    }

    /// Generates the menu. Every returned instance has an empty attendee list.
    pub fn generate<R: Rng>(
        &self,
        fixed: &[FixedPlacement],
        rng: &mut R,
    ) -> Vec<ScheduledInstance> {
        let mut menu = Menu::default();
        let room_order = self.rooms_by_size(rng);

        self.place_fixed(&mut menu, fixed);
        let fixed_count = menu.placements.len();
        self.place_plenary(&mut menu, &room_order);
        self.place_mandatory(&mut menu, &room_order);
        self.place_electives(&mut menu, &room_order, rng);
        self.cover_slots(&mut menu, &room_order);

        info!(
            "Master schedule: {} instances ({} fixed) over {} slots and {} rooms",
            menu.placements.len(),
            fixed_count,
            self.slots.len(),
            self.rooms.len()
        );

        menu.placements
            .iter()
            .map(|&(session, slot, room)| {
                ScheduledInstance::new(
                    &self.sessions[session].id,
                    &self.slots[slot].id,
                    &self.rooms[room].id,
                )
            })
            .collect()
    }

    fn capacity(&self, session: usize, slot: usize, room: usize) -> u32 {
        self.rules
            .capacity(&self.rooms[room], &self.sessions[session], self.slots[slot])
    }

    /// Room indices, largest first, equal sizes in random order.
    fn rooms_by_size<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.rooms.len()).collect();
        order.shuffle(rng);
        order.sort_by(|&a, &b| self.rooms[b].capacity.cmp(&self.rooms[a].capacity));
        order
    }

    fn free_room(&self, menu: &Menu, session: usize, slot: usize, order: &[usize]) -> Option<usize> {
        order
            .iter()
            .copied()
            .find(|&room| menu.is_free(slot, room) && self.capacity(session, slot, room) > 0)
    }

    fn place_fixed(&self, menu: &mut Menu, fixed: &[FixedPlacement]) {
        for f in fixed {
            let session = self.sessions.iter().position(|s| s.id == f.session_id);
            let slot = self.slots.iter().position(|s| s.id == f.slot_id);
            let room = self.rooms.iter().position(|r| r.id == f.room_id);
            match (session, slot, room) {
                (Some(session), Some(slot), Some(room)) if menu.is_free(slot, room) => {
                    menu.place(session, slot, room);
                }
                (Some(_), Some(_), Some(_)) => warn!(
                    "Fixed placement of '{}' collides in room '{}' at slot '{}'; skipped",
                    f.session_id, f.room_id, f.slot_id
                ),
                _ => warn!(
                    "Fixed placement of '{}' references unknown data; skipped",
                    f.session_id
                ),
            }
        }
    }

    fn place_plenary(&self, menu: &mut Menu, room_order: &[usize]) {
        let Some(plenary) = self
            .sessions
            .iter()
            .position(|s| s.session_type == SessionType::Plenary)
        else {
            return;
        };
        if menu.count(plenary) > 0 || self.slots.is_empty() {
            return;
        }

        let designated = self
            .config
            .plenary_slot
            .as_deref()
            .and_then(|id| self.slots.iter().position(|s| s.id == id))
            .or_else(|| self.slots.iter().position(|s| s.day == 1))
            .unwrap_or(0);
        let room = self
            .rules
            .plenary_room
            .as_deref()
            .and_then(|id| self.rooms.iter().position(|r| r.id == id))
            .or_else(|| room_order.first().copied());
        let Some(room) = room else {
            return;
        };

        let mut slot_order: Vec<usize> = vec![designated];
        slot_order.extend((0..self.slots.len()).filter(|&s| s != designated));
        for slot in slot_order {
            if menu.is_free(slot, room) && self.capacity(plenary, slot, room) > 0 {
                menu.place(plenary, slot, room);
                return;
            }
        }
        warn!("Plenary '{}' could not be placed", self.sessions[plenary].id);
    }

    fn place_mandatory(&self, menu: &mut Menu, room_order: &[usize]) {
        let mut cursor = 0usize;
        for (si, session) in self.sessions.iter().enumerate() {
            if session.session_type != SessionType::Mandatory {
                continue;
            }
            let needed = (session.repeats as usize).saturating_sub(menu.count(si));
            let day_one: Vec<usize> = (0..self.slots.len())
                .filter(|&s| self.slots[s].day == 1 && session.allows_slot(self.slots[s]))
                .collect();

            for placed in 0..needed {
                let spot = (0..day_one.len()).find_map(|k| {
                    let slot = day_one[(cursor + k) % day_one.len()];
                    self.free_room(menu, si, slot, room_order)
                        .map(|room| (k, slot, room))
                });
                match spot {
                    Some((k, slot, room)) => {
                        menu.place(si, slot, room);
                        cursor += k + 1;
                    }
                    None => {
                        warn!(
                            "Mandatory '{}' placed {} of {} additional instances",
                            session.id, placed, needed
                        );
                        break;
                    }
                }
            }
        }
    }

    fn elective_indices(&self) -> Vec<usize> {
        (0..self.sessions.len())
            .filter(|&s| self.sessions[s].session_type == SessionType::Elective)
            .collect()
    }

    fn place_electives<R: Rng>(&self, menu: &mut Menu, room_order: &[usize], rng: &mut R) {
        let electives = self.elective_indices();
        if electives.is_empty() {
            return;
        }

        let demand = session_demand(self.advisors);
        let weight = |s: usize| demand.get(&self.sessions[s].id).copied().unwrap_or(0.0);
        let total_weight: f64 = electives.iter().map(|&e| weight(e)).sum();

        let required = self.sessions.iter().filter(|s| s.is_required()).count();
        let seats = (self.advisors.len() * self.slots.len().saturating_sub(required)) as f64;
        let avg_capacity = self.average_room_capacity();

        let mut remaining: HashMap<usize, usize> = HashMap::new();
        for &e in &electives {
            let share = if total_weight > 0.0 {
                weight(e) / total_weight
            } else {
                1.0 / electives.len() as f64
            };
            let wanted = (seats * share * self.config.over_provision / avg_capacity).ceil() as usize;
            let repeats = self.sessions[e].repeats as usize;
            let eligible = (0..self.slots.len())
                .filter(|&s| self.sessions[e].allows_slot(self.slots[s]))
                .count();
            let quota = wanted.max(repeats).max(1).min(eligible.max(repeats));
            remaining.insert(e, quota.saturating_sub(menu.count(e)));
        }

        let mut order = electives.clone();
        order.sort_by(|&a, &b| {
            weight(b)
                .partial_cmp(&weight(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        loop {
            let mut progress = false;
            for &e in &order {
                let left = remaining.get(&e).copied().unwrap_or(0);
                if left == 0 {
                    continue;
                }
                if self.place_spread(menu, e, room_order, rng) {
                    remaining.insert(e, left - 1);
                    progress = true;
                } else {
                    warn!(
                        "Elective '{}' is {} instances short of its quota",
                        self.sessions[e].id, left
                    );
                    remaining.insert(e, 0);
                }
            }
            if !progress {
                break;
            }
        }
    }

    /// Places one instance in the allowed slot where the session is least
    /// represented, then where fewest instances exist.
    fn place_spread<R: Rng>(
        &self,
        menu: &mut Menu,
        session: usize,
        room_order: &[usize],
        rng: &mut R,
    ) -> bool {
        let best = (0..self.slots.len())
            .filter(|&s| self.sessions[session].allows_slot(self.slots[s]))
            .filter_map(|s| {
                self.free_room(menu, session, s, room_order).map(|room| {
                    let key = (menu.count_in_slot(session, s), menu.load(s), rng.random::<u32>());
                    (key, s, room)
                })
            })
            .min_by_key(|(key, _, _)| *key);

        match best {
            Some((_, slot, room)) => {
                menu.place(session, slot, room);
                true
            }
            None => false,
        }
    }

    fn cover_slots(&self, menu: &mut Menu, room_order: &[usize]) {
        let electives = self.elective_indices();
        let demand = session_demand(self.advisors);
        let required = self.sessions.iter().filter(|s| s.is_required()).count();

        for slot in 0..self.slots.len() {
            let eligible: Vec<usize> = electives
                .iter()
                .copied()
                .filter(|&e| self.sessions[e].allows_slot(self.slots[slot]))
                .collect();
            let variety_target = (required + 1).min(eligible.len());
            let seats_needed = self.expected_elective_load(menu, slot) * self.config.over_provision;

            loop {
                let in_slot: Vec<(usize, usize)> = menu
                    .placements
                    .iter()
                    .filter(|p| p.1 == slot && self.sessions[p.0].session_type == SessionType::Elective)
                    .map(|p| (p.0, p.2))
                    .collect();
                let seats: u32 = in_slot
                    .iter()
                    .map(|&(s, room)| self.capacity(s, slot, room))
                    .sum();
                let mut distinct: Vec<usize> = in_slot.iter().map(|p| p.0).collect();
                distinct.sort_unstable();
                distinct.dedup();

                if f64::from(seats) >= seats_needed && distinct.len() >= variety_target {
                    break;
                }

                // Prefer electives missing from the slot, then the highest demand per instance.
                let pick = eligible
                    .iter()
                    .copied()
                    .filter_map(|e| {
                        self.free_room(menu, e, slot, room_order).map(|room| {
                            let present = distinct.contains(&e);
                            let pressure = demand.get(&self.sessions[e].id).copied().unwrap_or(0.0)
                                / (menu.count(e) + 1) as f64;
                            (present, pressure, e, room)
                        })
                    })
                    .min_by(|a, b| {
                        a.0.cmp(&b.0).then(
                            b.1.partial_cmp(&a.1)
                                .unwrap_or(std::cmp::Ordering::Equal),
                        )
                    });

                match pick {
                    Some((_, _, e, room)) => menu.place(e, slot, room),
                    None => break,
                }
            }
        }
    }

    /// Advisors expected to need an elective in `slot`: everyone minus the
    /// share each required session is expected to absorb there.
    fn expected_elective_load(&self, menu: &Menu, slot: usize) -> f64 {
        let advisors = self.advisors.len() as f64;
        let mut absorbed = 0.0;
        for (si, session) in self.sessions.iter().enumerate() {
            if !session.is_required() {
                continue;
            }
            let mut here = 0u32;
            let mut total = 0u32;
            for &(s, sl, room) in &menu.placements {
                if s != si {
                    continue;
                }
                let cap = self.capacity(s, sl, room);
                total += cap;
                if sl == slot {
                    here += cap;
                }
            }
            if total > 0 {
                absorbed += advisors * f64::from(here) / f64::from(total);
            }
        }
        (advisors - absorbed).max(0.0)
    }

    fn average_room_capacity(&self) -> f64 {
        let rooms: Vec<u32> = self
            .rooms
            .iter()
            .filter(|r| self.rules.plenary_room.as_deref() != Some(r.id.as_str()))
            .map(|r| r.capacity)
            .collect();
        if rooms.is_empty() {
            return 1.0;
        }
        (f64::from(rooms.iter().sum::<u32>()) / rooms.len() as f64).max(1.0)
    }
}
