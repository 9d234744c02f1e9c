//! Defect-driven genetic operators.
//!
//! Crossover is uniform per gene. Mutation diagnoses the worst outstanding
//! defect of the individual and applies one edit aimed at it:
//!
//! | Worst defect | Mutation |
//! |--------------|----------|
//! | Missing required session | [`mandatory_mutation`] |
//! | Capacity violation | [`capacity_mutation`] |
//! | Unfilled slot | [`unfilled_mutation`] |
//! | None | [`swap_mutation`] |
//!
//! When the targeted edit finds nothing to change, a swap is tried instead.
//!
//! # Usage
//!
//! ```
//! use u_agenda::ga::operators::{GeneticOperators, MutationType};
//! use u_agenda::ga::DefectClass;
//!
//! let ops = GeneticOperators::default();
//! assert!(ops.targeted);
//! assert_eq!(MutationType::for_defect(DefectClass::UnfilledSlot), MutationType::Unfilled);
//! ```

use rand::Rng;

use super::fitness::DefectClass;
use super::genome::{
    capacity_mutation, mandatory_mutation, swap_mutation, uniform_crossover, unfilled_mutation,
    Individual,
};
use super::problem::AgendaProblem;

/// Mutation edit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    /// Place a missing required session.
    Mandatory,
    /// Move an attendee out of an overfull instance.
    Capacity,
    /// Fill an empty slot.
    Unfilled,
    /// Exchange two advisors' genes in one slot.
    Swap,
}

impl MutationType {
    /// Edit aimed at a defect class.
    pub fn for_defect(defect: DefectClass) -> Self {
        match defect {
            DefectClass::MandatoryMissing => MutationType::Mandatory,
            DefectClass::CapacityViolation => MutationType::Capacity,
            DefectClass::UnfilledSlot => MutationType::Unfilled,
            DefectClass::None => MutationType::Swap,
        }
    }
}

/// Crossover and mutation used by the GA loop.
#[derive(Debug, Clone)]
pub struct GeneticOperators {
    /// Diagnose the worst defect before mutating. When off, every mutation
    /// is a swap.
    pub targeted: bool,
}

impl Default for GeneticOperators {
    fn default() -> Self {
        Self { targeted: true }
    }
}

impl GeneticOperators {
    /// Produces one child from two parents.
    pub fn crossover<R: Rng>(
        &self,
        problem: &AgendaProblem,
        p1: &Individual,
        p2: &Individual,
        rng: &mut R,
    ) -> Individual {
        uniform_crossover(problem, p1, p2, rng)
    }

    /// Applies one mutation.
    ///
    /// Unevaluated individuals are scored first so the diagnosis sees
    /// current stats.
    ///
    /// # Returns
    /// The edit applied, or `None` when nothing could change.
    pub fn mutate<R: Rng>(
        &self,
        problem: &AgendaProblem,
        individual: &mut Individual,
        rng: &mut R,
    ) -> Option<MutationType> {
        let kind = if self.targeted {
            if individual.fitness == f64::NEG_INFINITY {
                individual.evaluate(problem);
            }
            MutationType::for_defect(individual.stats.worst_defect())
        } else {
            MutationType::Swap
        };

        let applied = match kind {
            MutationType::Mandatory => mandatory_mutation(problem, individual, rng),
            MutationType::Capacity => capacity_mutation(problem, individual, rng),
            MutationType::Unfilled => unfilled_mutation(problem, individual, rng),
            MutationType::Swap => swap_mutation(problem, individual, rng),
        };
        if applied {
            Some(kind)
        } else if kind != MutationType::Swap && swap_mutation(problem, individual, rng) {
            Some(MutationType::Swap)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::VenueRules;
    use crate::ga::genome::random_individual;
    use crate::models::{Advisor, Room, ScheduledInstance, Session, TimeSlot};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn make_test_problem() -> AgendaProblem {
        let rooms = vec![Room::new("R1", 3), Room::new("R2", 3)];
        let slots = vec![TimeSlot::new("S1", 1), TimeSlot::new("S2", 1).with_start_minute(660)];
        let sessions = vec![
            Session::mandatory("M", 1),
            Session::elective("E1"),
            Session::elective("E2"),
        ];
        let advisors: Vec<Advisor> = (0..4)
            .map(|i| Advisor::new(format!("A{i}"), format!("Person {i}")).with_preferences(["E1", "E2"]))
            .collect();
        let menu = vec![
            ScheduledInstance::new("M", "S1", "R1"),
            ScheduledInstance::new("E1", "S1", "R2"),
            ScheduledInstance::new("E1", "S2", "R1"),
            ScheduledInstance::new("E2", "S2", "R2"),
        ];
        AgendaProblem::new(
            &rooms,
            &slots,
            &sessions,
            &advisors,
            &menu,
            &Default::default(),
            &VenueRules::default(),
        )
    }

    #[test]
    fn test_defect_dispatch() {
        assert_eq!(MutationType::for_defect(DefectClass::MandatoryMissing), MutationType::Mandatory);
        assert_eq!(MutationType::for_defect(DefectClass::CapacityViolation), MutationType::Capacity);
        assert_eq!(MutationType::for_defect(DefectClass::None), MutationType::Swap);
    }

    #[test]
    fn test_mutate_targets_missing_mandatory() {
        let p = make_test_problem();
        let ops = GeneticOperators::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut ind = Individual::empty(&p);
        for a in 0..4 {
            ind.add_gene(&p, a, 1);
        }
        assert_eq!(ops.mutate(&p, &mut ind, &mut rng), Some(MutationType::Mandatory));
        assert_eq!(ind.attendees(0).len(), 1);
    }

    #[test]
    fn test_mutate_targets_unfilled() {
        let p = make_test_problem();
        let ops = GeneticOperators::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut ind = Individual::empty(&p);
        for a in 0..4 {
            ind.add_gene(&p, a, 0);
        }
        assert_eq!(ops.mutate(&p, &mut ind, &mut rng), Some(MutationType::Unfilled));
        assert_eq!(ind.genome().gene_count(), 5);
    }

    #[test]
    fn test_untargeted_only_swaps() {
        let p = make_test_problem();
        let ops = GeneticOperators { targeted: false };
        let mut rng = SmallRng::seed_from_u64(1);
        let mut ind = Individual::empty(&p);
        for a in 0..4 {
            ind.add_gene(&p, a, 0);
        }
        // Everyone holds M only: nothing to swap
        assert_eq!(ops.mutate(&p, &mut ind, &mut rng), None);
    }

    #[test]
    fn test_crossover_child_consistent() {
        let p = make_test_problem();
        let ops = GeneticOperators::default();
        let mut rng = SmallRng::seed_from_u64(9);
        let p1 = random_individual(&p, &mut rng);
        let p2 = random_individual(&p, &mut rng);
        let child = ops.crossover(&p, &p1, &p2, &mut rng);
        assert!(child.is_consistent(&p));
        assert_eq!(child.fitness, f64::NEG_INFINITY);
    }
}
