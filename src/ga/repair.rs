//! Deterministic repair pass.
//!
//! Pushes an individual toward feasibility in fixed phases:
//!
//! 1. Presenter obligations are written into the genome.
//! 2. Advisors missing a plenary or mandatory session are placed into an
//!    instance of it: a free slot with a spare seat, else a slot holding an
//!    elective where a seat is spare, else the least-full instance in any slot
//!    not holding another required session or an obligation.
//! 3. Empty slots are filled with a non-duplicate instance, spare seats and
//!    better preference ranks first, least-full otherwise.
//! 4. Duplicate sessions are removed (obligations and the earliest regular
//!    gene survive) and the vacated slots refilled.
//! 5. Overfull instances evict their worst-ranked regular attendees into
//!    other instances of the same slot; required sessions may also move the
//!    attendee to another slot's instance of the same session. When nobody
//!    can move within the slot, an attendee trades slots: a session they
//!    hold elsewhere is taken in this slot instead and the other slot is
//!    refilled.
//! 6. Elective instances below the attendance floor are backfilled from
//!    well-attended instances of the same slot or, failing that, emptied:
//!    each attendee moves to a well-attended instance, trading slots when
//!    the session there is already held elsewhere. No move leaves a hole,
//!    overfills a room or creates another thin instance.
//!
//! No randomness is involved. On a feasible individual without thin
//! instances no phase changes anything, so the pass is idempotent there.

use log::debug;
use serde::{Deserialize, Serialize};

use super::genome::{preference_key, viable_instances, Individual};
use super::problem::AgendaProblem;

/// Outcome of [`Repairer::repair_until_stable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairOutcome {
    /// Repair passes executed.
    pub attempts: usize,
    /// Whether the individual ended feasible.
    pub feasible: bool,
}

/// Repair pass bound to one problem.
pub struct Repairer<'a> {
    problem: &'a AgendaProblem,
}

impl<'a> Repairer<'a> {
    /// Creates a repairer.
    pub fn new(problem: &'a AgendaProblem) -> Self {
        Self { problem }
    }

    /// Runs every phase once.
    pub fn repair(&self, individual: &mut Individual) {
        self.enforce_obligations(individual);
        self.place_required(individual);
        self.fill_holes(individual);
        self.remove_duplicates(individual);
        self.rebalance(individual);
        self.resolve_thin(individual);
        debug_assert!(individual.is_consistent(self.problem));
    }

    /// Backfills or empties thin instances of an evaluated individual.
    ///
    /// Feasible individuals skip [`Repairer::repair_until_stable`], so this is
    /// the clean-up to run on a final schedule. The change is kept only when
    /// it scores at least as well.
    ///
    /// # Returns
    /// Whether the individual changed.
    pub fn consolidate(&self, individual: &mut Individual) -> bool {
        let p = self.problem;
        if individual.fitness == f64::NEG_INFINITY {
            individual.evaluate(p);
        }
        let mut trial = individual.clone();
        self.resolve_thin(&mut trial);
        if trial.genome() == individual.genome() {
            return false;
        }
        trial.evaluate(p);
        if trial.fitness < individual.fitness {
            return false;
        }
        debug!(
            "Consolidated thin instances: {} -> {}",
            individual.stats.thin_instances, trial.stats.thin_instances
        );
        *individual = trial;
        true
    }

    /// Repairs and re-scores until feasible, until a pass changes nothing, or
    /// until `max_attempts` passes ran.
    ///
    /// Obligations are enforced up front. The individual ends as the
    /// best-scoring state seen from then on, so the result never scores
    /// below the input with its obligations in place.
    pub fn repair_until_stable(&self, individual: &mut Individual, max_attempts: usize) -> RepairOutcome {
        self.enforce_obligations(individual);
        individual.evaluate(self.problem);
        let mut best = individual.clone();

        let mut attempts = 0;
        while attempts < max_attempts && !individual.stats.is_feasible() {
            let before = individual.genome().clone();
            self.repair(individual);
            attempts += 1;
            individual.evaluate(self.problem);
            if individual.fitness > best.fitness {
                best = individual.clone();
            }
            if individual.genome() == &before {
                break;
            }
        }

        if best.fitness > individual.fitness {
            *individual = best;
        }
        RepairOutcome {
            attempts,
            feasible: individual.stats.is_feasible(),
        }
    }

    fn enforce_obligations(&self, individual: &mut Individual) {
        let p = self.problem;
        for a in 0..p.advisor_count() {
            for slot in 0..p.slot_count() {
                if let Some(i) = p.obligation(a, slot) {
                    if individual.gene(a, slot) != Some(i) {
                        individual.add_gene(p, a, i);
                    }
                }
            }
        }
    }

    fn place_required(&self, individual: &mut Individual) {
        let p = self.problem;
        for a in 0..p.advisor_count() {
            for &r in p.required_sessions() {
                if individual.attends(p, a, r) {
                    continue;
                }
                let candidates: Vec<usize> = p
                    .instances_of_session(r)
                    .iter()
                    .copied()
                    .filter(|&i| {
                        let slot = p.instance(i).slot;
                        p.obligation(a, slot).is_none()
                            && individual
                                .gene(a, slot)
                                .is_none_or(|g| !p.is_required(p.session_of(g)))
                    })
                    .collect();
                let spare: Vec<usize> = candidates
                    .iter()
                    .copied()
                    .filter(|&i| individual.has_spare_seat(p, i))
                    .collect();
                let load = |&i: &usize| (individual.seat_load(p, i), i);

                // Free slot, then a slot holding an elective, then least full
                let target = spare
                    .iter()
                    .copied()
                    .filter(|&i| individual.gene(a, p.instance(i).slot).is_none())
                    .min_by_key(load)
                    .or_else(|| spare.iter().copied().min_by_key(load))
                    .or_else(|| candidates.iter().copied().min_by_key(load));

                match target {
                    Some(i) => {
                        individual.add_gene(p, a, i);
                    }
                    None => debug!(
                        "Advisor '{}' cannot be placed in '{}'",
                        p.advisors[a].id, p.sessions[r].id
                    ),
                }
            }
        }
    }

    fn fill_holes(&self, individual: &mut Individual) {
        let p = self.problem;
        for a in 0..p.advisor_count() {
            for slot in 0..p.slot_count() {
                if individual.gene(a, slot).is_none() && p.obligation(a, slot).is_none() {
                    self.fill_slot(individual, a, slot);
                }
            }
        }
    }

    /// Puts the advisor into the best non-duplicate instance of a slot.
    ///
    /// Instances with a spare seat win, ordered by preference then load.
    /// Without one the least-overfull instance is taken. Left empty when every
    /// instance would duplicate a session.
    fn fill_slot(&self, individual: &mut Individual, advisor: usize, slot: usize) -> bool {
        let p = self.problem;
        let best = viable_instances(p, individual, advisor, slot)
            .into_iter()
            .min_by_key(|&i| {
                let load = individual.seat_load(p, i);
                let capacity = p.instance(i).capacity;
                if load < capacity {
                    (0, preference_key(p, advisor, i), load, i)
                } else {
                    (1, load + 1 - capacity, load, i)
                }
            });
        match best {
            Some(i) => {
                individual.add_gene(p, advisor, i);
                true
            }
            None => false,
        }
    }

    fn remove_duplicates(&self, individual: &mut Individual) {
        let p = self.problem;
        for a in 0..p.advisor_count() {
            let mut seen: Vec<usize> = (0..p.slot_count())
                .filter_map(|slot| p.obligation(a, slot).map(|i| p.session_of(i)))
                .collect();
            let mut vacated = Vec::new();
            for slot in 0..p.slot_count() {
                if p.obligation(a, slot).is_some() {
                    continue;
                }
                let Some(i) = individual.gene(a, slot) else {
                    continue;
                };
                let session = p.session_of(i);
                if seen.contains(&session) {
                    individual.remove_gene(p, a, slot);
                    vacated.push(slot);
                } else {
                    seen.push(session);
                }
            }
            for slot in vacated {
                self.fill_slot(individual, a, slot);
            }
        }
    }

    fn rebalance(&self, individual: &mut Individual) {
        let p = self.problem;
        let max_rounds = p.advisor_count() * p.slot_count() + 1;
        for _ in 0..max_rounds {
            let mut moved = false;
            for i in 0..p.instances.len() {
                while individual.seat_load(p, i) > p.instance(i).capacity {
                    if !self.evict_one(individual, i) {
                        break;
                    }
                    moved = true;
                }
            }
            if !moved {
                return;
            }
        }
        debug!("Rebalancing stopped after {max_rounds} rounds");
    }

    /// Moves one regular attendee out of an overfull instance.
    ///
    /// Attendees are tried worst preference rank first; the first one with a
    /// valid destination moves.
    fn evict_one(&self, individual: &mut Individual, instance: usize) -> bool {
        let p = self.problem;
        let session = p.session_of(instance);
        let mut evictable: Vec<usize> = individual
            .attendees(instance)
            .iter()
            .copied()
            .filter(|&a| !p.is_presenter(a, instance))
            .collect();
        evictable.sort_by_key(|&a| {
            let rank = p.rank(a, session).unwrap_or(usize::MAX);
            (std::cmp::Reverse(rank), a)
        });

        for &a in &evictable {
            let target = if p.is_required(session) {
                self.required_destination(individual, a, instance)
            } else {
                self.elective_destination(individual, a, instance)
            };
            if let Some(j) = target {
                self.relocate(individual, a, instance, j);
                return true;
            }
        }
        evictable
            .iter()
            .any(|&a| self.exchange_slots(individual, a, instance))
    }

    /// Moves a session the advisor attends in another slot into the overfull
    /// instance's slot, then refills the other slot.
    fn exchange_slots(&self, individual: &mut Individual, advisor: usize, from: usize) -> bool {
        let p = self.problem;
        let slot = p.instance(from).slot;
        let mut best: Option<(usize, usize)> = None;
        for other in (0..p.slot_count()).filter(|&s| s != slot) {
            if p.obligation(advisor, other).is_some() {
                continue;
            }
            let Some(g) = individual.gene(advisor, other) else {
                continue;
            };
            let session = p.session_of(g);
            let target = p
                .instances_in_slot(slot)
                .iter()
                .copied()
                .filter(|&j| p.session_of(j) == session && individual.has_spare_seat(p, j))
                .min_by_key(|&j| (individual.seat_load(p, j), j));
            if let Some(j) = target {
                best = Some((other, j));
                break;
            }
        }

        let Some((other, j)) = best else {
            return false;
        };
        individual.remove_gene(p, advisor, other);
        individual.add_gene(p, advisor, j);
        self.fill_slot(individual, advisor, other);
        true
    }

    /// Same session in the same slot, else the same session in another slot.
    fn required_destination(&self, individual: &Individual, advisor: usize, from: usize) -> Option<usize> {
        let p = self.problem;
        let slot = p.instance(from).slot;
        let others = p
            .instances_of_session(p.session_of(from))
            .iter()
            .copied()
            .filter(|&j| j != from);

        let same_slot = others
            .clone()
            .filter(|&j| p.instance(j).slot == slot)
            .filter(|&j| self.relieves(individual, from, j))
            .min_by_key(|&j| (individual.seat_load(p, j), j));
        same_slot.or_else(|| {
            others
                .filter(|&j| {
                    let s = p.instance(j).slot;
                    s != slot
                        && individual.has_spare_seat(p, j)
                        && p.obligation(advisor, s).is_none()
                        && individual
                            .gene(advisor, s)
                            .is_none_or(|g| !p.is_required(p.session_of(g)))
                })
                .min_by_key(|&j| (individual.seat_load(p, j), j))
        })
    }

    /// Preferred instance with a spare seat, any instance with a spare seat,
    /// then any instance the move leaves less overfull than the source.
    fn elective_destination(&self, individual: &Individual, advisor: usize, from: usize) -> Option<usize> {
        let p = self.problem;
        let slot = p.instance(from).slot;
        let candidates: Vec<usize> = viable_instances(p, individual, advisor, slot)
            .into_iter()
            .filter(|&j| j != from)
            .collect();
        let spare: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&j| individual.has_spare_seat(p, j))
            .collect();

        spare
            .iter()
            .filter_map(|&j| p.rank(advisor, p.session_of(j)).map(|r| (r, j)))
            .min_by_key(|&(r, j)| (r, individual.seat_load(p, j), j))
            .map(|(_, j)| j)
            .or_else(|| spare.iter().copied().min_by_key(|&j| (individual.seat_load(p, j), j)))
            .or_else(|| {
                candidates
                    .iter()
                    .copied()
                    .filter(|&j| self.relieves(individual, from, j))
                    .min_by_key(|&j| (individual.seat_load(p, j), j))
            })
    }

    /// Whether moving one seat from `from` to `to` lowers the larger overflow.
    fn relieves(&self, individual: &Individual, from: usize, to: usize) -> bool {
        let p = self.problem;
        let over_from = individual.seat_load(p, from).saturating_sub(p.instance(from).capacity);
        let over_to = (individual.seat_load(p, to) + 1).saturating_sub(p.instance(to).capacity);
        over_to < over_from
    }

    fn resolve_thin(&self, individual: &mut Individual) {
        let p = self.problem;
        if p.min_attendance < 2 {
            return;
        }
        for i in 0..p.instances.len() {
            let listed = individual.attendees(i).len();
            if listed == 0 || listed >= p.min_attendance || p.is_required(p.session_of(i)) {
                continue;
            }
            let mut trial = individual.clone();
            if self.backfill(&mut trial, i) {
                *individual = trial;
                continue;
            }
            let mut trial = individual.clone();
            if self.empty_out(&mut trial, i) {
                *individual = trial;
            } else {
                debug!(
                    "Thin instance of '{}' at '{}' kept",
                    p.sessions[p.session_of(i)].id,
                    p.slots[p.instance(i).slot].id
                );
            }
        }
    }

    /// Pulls regular attendees of the same slot into a thin instance until it
    /// reaches the floor. Donor instances stay above the floor.
    fn backfill(&self, individual: &mut Individual, thin: usize) -> bool {
        let p = self.problem;
        let session = p.session_of(thin);
        let slot = p.instance(thin).slot;
        while individual.attendees(thin).len() < p.min_attendance {
            if !individual.has_spare_seat(p, thin) {
                return false;
            }
            let view: &Individual = individual;
            let donor = p
                .instances_in_slot(slot)
                .iter()
                .copied()
                .filter(|&j| {
                    j != thin
                        && !p.is_required(p.session_of(j))
                        && view.attendees(j).len() > p.min_attendance
                })
                .flat_map(move |j| view.attendees(j).iter().map(move |&a| (a, j)))
                .filter(|&(a, j)| !p.is_presenter(a, j) && !view.attends_elsewhere(p, a, session, slot))
                .min_by_key(|&(a, _)| (p.rank(a, session).unwrap_or(usize::MAX), a));
            let Some((a, _)) = donor else {
                return false;
            };
            individual.add_gene(p, a, thin);
        }
        true
    }

    /// Moves every attendee out of a thin instance without a presenter.
    fn empty_out(&self, individual: &mut Individual, thin: usize) -> bool {
        let p = self.problem;
        let movers = individual.attendees(thin).to_vec();
        if movers.iter().any(|&a| p.is_presenter(a, thin)) {
            return false;
        }
        movers.into_iter().all(|a| self.move_out(individual, a, thin))
    }

    /// Moves one attendee of a thin instance to a well-attended instance of
    /// the same slot.
    ///
    /// When the advisor already holds that session in another slot, the gene
    /// there is swapped for a well-attended instance of a session they lack.
    fn move_out(&self, individual: &mut Individual, advisor: usize, from: usize) -> bool {
        let p = self.problem;
        let slot = p.instance(from).slot;
        let mut targets: Vec<usize> = p
            .instances_in_slot(slot)
            .iter()
            .copied()
            .filter(|&j| j != from && self.absorbs(individual, j))
            .collect();
        targets.sort_by_key(|&j| (p.rank(advisor, p.session_of(j)).unwrap_or(usize::MAX), j));

        let direct = targets
            .iter()
            .copied()
            .find(|&j| !individual.attends_elsewhere(p, advisor, p.session_of(j), slot));
        if let Some(j) = direct {
            individual.add_gene(p, advisor, j);
            return true;
        }

        for &j in &targets {
            let session = p.session_of(j);
            let held = (0..p.slot_count())
                .filter(|&t| t != slot && p.obligation(advisor, t).is_none())
                .find_map(|t| {
                    individual
                        .gene(advisor, t)
                        .filter(|&g| p.session_of(g) == session)
                        .map(|g| (t, g))
                });
            let Some((other, g)) = held else {
                continue;
            };
            let left = individual.attendees(g).len() - 1;
            if left > 0 && left < p.min_attendance {
                continue;
            }

            individual.add_gene(p, advisor, j);
            let replacement = p
                .instances_in_slot(other)
                .iter()
                .copied()
                .filter(|&k| {
                    k != g
                        && p.session_of(k) != session
                        && self.absorbs(individual, k)
                        && !individual.attends_elsewhere(p, advisor, p.session_of(k), other)
                })
                .min_by_key(|&k| (p.rank(advisor, p.session_of(k)).unwrap_or(usize::MAX), k));
            match replacement {
                Some(k) => {
                    individual.add_gene(p, advisor, k);
                    return true;
                }
                None => {
                    individual.add_gene(p, advisor, from);
                }
            }
        }
        false
    }

    /// Non-empty, has a spare seat, and reaches the floor with one more.
    fn absorbs(&self, individual: &Individual, instance: usize) -> bool {
        let n = individual.attendees(instance).len();
        n > 0 && n + 1 >= self.problem.min_attendance && individual.has_spare_seat(self.problem, instance)
    }

    fn relocate(&self, individual: &mut Individual, advisor: usize, from: usize, to: usize) {
        let p = self.problem;
        let from_slot = p.instance(from).slot;
        individual.add_gene(p, advisor, to);
        if p.instance(to).slot != from_slot {
            individual.remove_gene(p, advisor, from_slot);
            self.fill_slot(individual, advisor, from_slot);
        }
    }
}
