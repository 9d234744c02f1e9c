//! Per-advisor genome and its materialized individual.
//!
//! # Encoding
//!
//! The genome is an advisor × slot matrix. A gene is the index of the menu
//! instance the advisor attends in that slot, or nothing.
//!
//! An [`Individual`] keeps the genome and, for every instance, the sorted list
//! of advisors attending it. Both views change only through
//! [`Individual::add_gene`] and [`Individual::remove_gene`], so they can never
//! drift apart.

use rand::prelude::IndexedRandom;
use rand::seq::SliceRandom;
use rand::Rng;

use super::fitness::{evaluate, ScheduleStats};
use super::problem::AgendaProblem;

/// Advisor × slot matrix of instance indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genome {
    genes: Vec<Vec<Option<usize>>>,
}

impl Genome {
    /// Creates a genome without genes.
    pub fn empty(advisors: usize, slots: usize) -> Self {
        Self {
            genes: vec![vec![None; slots]; advisors],
        }
    }

    /// Gene of an advisor in a slot.
    #[inline]
    pub fn get(&self, advisor: usize, slot: usize) -> Option<usize> {
        self.genes[advisor][slot]
    }

    /// Genes of one advisor, indexed by slot.
    pub fn advisor_genes(&self, advisor: usize) -> &[Option<usize>] {
        &self.genes[advisor]
    }

    /// Number of set genes.
    pub fn gene_count(&self) -> usize {
        self.genes.iter().flatten().filter(|g| g.is_some()).count()
    }
}

/// Candidate schedule: genome, materialized attendee lists and score.
#[derive(Debug, Clone)]
pub struct Individual {
    genome: Genome,
    attendees: Vec<Vec<usize>>,
    /// Fitness (higher = better). `NEG_INFINITY` until evaluated.
    pub fitness: f64,
    /// Snapshot from the last evaluation.
    pub stats: ScheduleStats,
}

impl Individual {
    /// Creates an individual without genes.
    pub fn empty(problem: &AgendaProblem) -> Self {
        Self {
            genome: Genome::empty(problem.advisor_count(), problem.slot_count()),
            attendees: vec![Vec::new(); problem.instances.len()],
            fitness: f64::NEG_INFINITY,
            stats: ScheduleStats::default(),
        }
    }

    /// Builds an individual from a genome, materializing attendee lists.
    pub fn from_genome(problem: &AgendaProblem, genome: Genome) -> Self {
        let mut attendees = vec![Vec::new(); problem.instances.len()];
        for (a, genes) in genome.genes.iter().enumerate() {
            for &i in genes.iter().flatten() {
                attendees[i].push(a);
            }
        }
        Self {
            genome,
            attendees,
            fitness: f64::NEG_INFINITY,
            stats: ScheduleStats::default(),
        }
    }

    /// The genome.
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Gene of an advisor in a slot.
    #[inline]
    pub fn gene(&self, advisor: usize, slot: usize) -> Option<usize> {
        self.genome.get(advisor, slot)
    }

    /// Advisors listed on an instance, ascending.
    #[inline]
    pub fn attendees(&self, instance: usize) -> &[usize] {
        &self.attendees[instance]
    }

    /// Sets the advisor's gene in the instance's slot.
    ///
    /// # Returns
    /// The instance previously held in that slot.
    pub fn add_gene(&mut self, problem: &AgendaProblem, advisor: usize, instance: usize) -> Option<usize> {
        let slot = problem.instance(instance).slot;
        let previous = self.genome.genes[advisor][slot];
        if previous == Some(instance) {
            return previous;
        }
        if let Some(old) = previous {
            self.detach(advisor, old);
        }
        self.genome.genes[advisor][slot] = Some(instance);
        if let Err(pos) = self.attendees[instance].binary_search(&advisor) {
            self.attendees[instance].insert(pos, advisor);
        }
        self.fitness = f64::NEG_INFINITY;
        previous
    }

    /// Clears the advisor's gene in a slot.
    ///
    /// # Returns
    /// The instance removed, if any.
    pub fn remove_gene(&mut self, problem: &AgendaProblem, advisor: usize, slot: usize) -> Option<usize> {
        debug_assert!(slot < problem.slot_count());
        let previous = self.genome.genes[advisor][slot].take();
        if let Some(old) = previous {
            self.detach(advisor, old);
            self.fitness = f64::NEG_INFINITY;
        }
        previous
    }

    fn detach(&mut self, advisor: usize, instance: usize) {
        let list = &mut self.attendees[instance];
        match list.binary_search(&advisor) {
            Ok(pos) => {
                list.remove(pos);
            }
            Err(_) => debug_assert!(false, "gene without attendee entry"),
        }
    }

    /// Seats taken: listed advisors minus presenters of the instance.
    pub fn seat_load(&self, problem: &AgendaProblem, instance: usize) -> usize {
        let presenting = problem
            .presenters_of(instance)
            .iter()
            .filter(|a| self.attendees[instance].binary_search(a).is_ok())
            .count();
        self.attendees[instance].len() - presenting
    }

    /// Whether another regular attendee fits.
    #[inline]
    pub fn has_spare_seat(&self, problem: &AgendaProblem, instance: usize) -> bool {
        self.seat_load(problem, instance) < problem.instance(instance).capacity
    }

    /// Whether the advisor attends `session` in any slot other than `except_slot`.
    pub fn attends_elsewhere(
        &self,
        problem: &AgendaProblem,
        advisor: usize,
        session: usize,
        except_slot: usize,
    ) -> bool {
        self.genome.genes[advisor]
            .iter()
            .enumerate()
            .any(|(slot, g)| slot != except_slot && g.is_some_and(|i| problem.session_of(i) == session))
    }

    /// Whether the advisor attends `session` at all.
    pub fn attends(&self, problem: &AgendaProblem, advisor: usize, session: usize) -> bool {
        self.genome.genes[advisor]
            .iter()
            .flatten()
            .any(|&i| problem.session_of(i) == session)
    }

    /// Scores the individual and stores fitness and stats.
    pub fn evaluate(&mut self, problem: &AgendaProblem) {
        let (fitness, stats) = evaluate(problem, self);
        self.fitness = fitness;
        self.stats = stats;
    }

    /// Whether the stored attendee lists equal a rebuild from the genome.
    pub fn is_consistent(&self, problem: &AgendaProblem) -> bool {
        Individual::from_genome(problem, self.genome.clone()).attendees == self.attendees
    }
}

/// Forces every presenter obligation into the genome.
pub fn inject_obligations(problem: &AgendaProblem, individual: &mut Individual) {
    for a in 0..problem.advisor_count() {
        for slot in 0..problem.slot_count() {
            if let Some(i) = problem.obligation(a, slot) {
                individual.add_gene(problem, a, i);
            }
        }
    }
}

/// Instances in `slot` the advisor could take without attending a session twice.
pub fn viable_instances(
    problem: &AgendaProblem,
    individual: &Individual,
    advisor: usize,
    slot: usize,
) -> Vec<usize> {
    problem
        .instances_in_slot(slot)
        .iter()
        .copied()
        .filter(|&i| !individual.attends_elsewhere(problem, advisor, problem.session_of(i), slot))
        .collect()
}

/// Preference key: required sessions first, then by rank, unranked last.
pub(crate) fn preference_key(problem: &AgendaProblem, advisor: usize, instance: usize) -> usize {
    let session = problem.session_of(instance);
    if problem.is_required(session) {
        0
    } else {
        problem.rank(advisor, session).map_or(usize::MAX, |r| r + 1)
    }
}

/// Creates a random individual.
///
/// Obligations are injected first. Every advisor then visits the slots in
/// random order and takes a viable instance with a free seat, preferring
/// required sessions and ranked preferences; now and then a uniformly random
/// viable instance instead.
pub fn random_individual<R: Rng>(problem: &AgendaProblem, rng: &mut R) -> Individual {
    let mut individual = Individual::empty(problem);
    inject_obligations(problem, &mut individual);

    let mut slot_order: Vec<usize> = (0..problem.slot_count()).collect();
    for a in 0..problem.advisor_count() {
        slot_order.shuffle(rng);
        for &slot in &slot_order {
            if individual.gene(a, slot).is_some() {
                continue;
            }
            let viable = viable_instances(problem, &individual, a, slot);
            if viable.is_empty() {
                continue;
            }
            let spare: Vec<usize> = viable
                .iter()
                .copied()
                .filter(|&i| individual.has_spare_seat(problem, i))
                .collect();
            let pool = if spare.is_empty() { &viable } else { &spare };

            let preferred = pool
                .iter()
                .copied()
                .filter(|&i| preference_key(problem, a, i) != usize::MAX)
                .min_by_key(|&i| preference_key(problem, a, i));
            let pick = match preferred {
                Some(i) if rng.random_bool(0.8) => i,
                _ => match pool.choose(rng) {
                    Some(&i) => i,
                    None => continue,
                },
            };
            individual.add_gene(problem, a, pick);
        }
    }
    individual
}

/// Uniform per-gene crossover.
///
/// Each (advisor, slot) gene comes from either parent with equal probability,
/// or from the only parent holding one. Parents are left untouched.
pub fn uniform_crossover<R: Rng>(
    problem: &AgendaProblem,
    p1: &Individual,
    p2: &Individual,
    rng: &mut R,
) -> Individual {
    let mut genome = Genome::empty(problem.advisor_count(), problem.slot_count());
    for a in 0..problem.advisor_count() {
        for slot in 0..problem.slot_count() {
            genome.genes[a][slot] = match (p1.gene(a, slot), p2.gene(a, slot)) {
                (Some(x), Some(y)) => Some(if rng.random_bool(0.5) { x } else { y }),
                (Some(x), None) | (None, Some(x)) => Some(x),
                (None, None) => None,
            };
        }
    }
    Individual::from_genome(problem, genome)
}

// ======================== Mutation operators ========================

/// Puts one advisor missing a required session into an instance of it.
///
/// The target slot must not hold an obligation or another required session.
pub fn mandatory_mutation<R: Rng>(problem: &AgendaProblem, individual: &mut Individual, rng: &mut R) -> bool {
    let mut missing = Vec::new();
    for a in 0..problem.advisor_count() {
        for &r in problem.required_sessions() {
            if !individual.attends(problem, a, r) {
                missing.push((a, r));
            }
        }
    }
    let Some(&(a, r)) = missing.choose(rng) else {
        return false;
    };
    let targets: Vec<usize> = problem
        .instances_of_session(r)
        .iter()
        .copied()
        .filter(|&i| {
            let slot = problem.instance(i).slot;
            problem.obligation(a, slot).is_none()
                && individual
                    .gene(a, slot)
                    .is_none_or(|g| !problem.is_required(problem.session_of(g)))
        })
        .collect();
    match targets.choose(rng) {
        Some(&i) => {
            individual.add_gene(problem, a, i);
            true
        }
        None => false,
    }
}

/// Moves one regular attendee out of an overfull instance to another
/// instance of the same slot, preferring one with a free seat.
pub fn capacity_mutation<R: Rng>(problem: &AgendaProblem, individual: &mut Individual, rng: &mut R) -> bool {
    let overfull: Vec<usize> = (0..problem.instances.len())
        .filter(|&i| individual.seat_load(problem, i) > problem.instance(i).capacity)
        .collect();
    let Some(&i) = overfull.choose(rng) else {
        return false;
    };
    let evictable: Vec<usize> = individual
        .attendees(i)
        .iter()
        .copied()
        .filter(|&a| !problem.is_presenter(a, i))
        .collect();
    let Some(&a) = evictable.choose(rng) else {
        return false;
    };

    let slot = problem.instance(i).slot;
    let others: Vec<usize> = viable_instances(problem, individual, a, slot)
        .into_iter()
        .filter(|&j| j != i)
        .collect();
    let spare: Vec<usize> = others
        .iter()
        .copied()
        .filter(|&j| individual.has_spare_seat(problem, j))
        .collect();
    let pool = if spare.is_empty() { &others } else { &spare };
    match pool.choose(rng) {
        Some(&j) => {
            individual.add_gene(problem, a, j);
            true
        }
        None => false,
    }
}

/// Fills one random empty slot with a viable instance.
pub fn unfilled_mutation<R: Rng>(problem: &AgendaProblem, individual: &mut Individual, rng: &mut R) -> bool {
    let mut holes = Vec::new();
    for a in 0..problem.advisor_count() {
        for slot in 0..problem.slot_count() {
            if individual.gene(a, slot).is_none() && problem.obligation(a, slot).is_none() {
                holes.push((a, slot));
            }
        }
    }
    let Some(&(a, slot)) = holes.choose(rng) else {
        return false;
    };
    let viable = viable_instances(problem, individual, a, slot);
    let spare: Vec<usize> = viable
        .iter()
        .copied()
        .filter(|&i| individual.has_spare_seat(problem, i))
        .collect();
    let pool = if spare.is_empty() { &viable } else { &spare };
    match pool.choose(rng) {
        Some(&i) => {
            individual.add_gene(problem, a, i);
            true
        }
        None => false,
    }
}

/// Exchanges the genes of two advisors in one slot.
///
/// Obligations and required sessions are never swapped, and a swap that
/// would make either advisor attend a session twice is rejected.
pub fn swap_mutation<R: Rng>(problem: &AgendaProblem, individual: &mut Individual, rng: &mut R) -> bool {
    let advisors = problem.advisor_count();
    let slots = problem.slot_count();
    if advisors < 2 || slots == 0 {
        return false;
    }

    for _ in 0..10 {
        let slot = rng.random_range(0..slots);
        let a = rng.random_range(0..advisors);
        let b = rng.random_range(0..advisors);
        let (Some(ga), Some(gb)) = (individual.gene(a, slot), individual.gene(b, slot)) else {
            continue;
        };
        let (sa, sb) = (problem.session_of(ga), problem.session_of(gb));
        if a == b
            || sa == sb
            || problem.is_required(sa)
            || problem.is_required(sb)
            || problem.obligation(a, slot).is_some()
            || problem.obligation(b, slot).is_some()
            || individual.attends_elsewhere(problem, a, sb, slot)
            || individual.attends_elsewhere(problem, b, sa, slot)
        {
            continue;
        }
        individual.add_gene(problem, a, gb);
        individual.add_gene(problem, b, ga);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::VenueRules;
    use crate::models::{Advisor, Room, ScheduledInstance, Session, TimeSlot};
    use crate::presenters::build_obligations;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// Three slots × two rooms: M twice, E1/E2/E3 spread, Vos presents E3.
    fn make_test_problem() -> AgendaProblem {
        let rooms = vec![Room::new("R1", 4), Room::new("R2", 4)];
        let slots = vec![
            TimeSlot::new("S1", 1).with_start_minute(540),
            TimeSlot::new("S2", 1).with_start_minute(660),
            TimeSlot::new("S3", 2).with_start_minute(540),
        ];
        let sessions = vec![
            Session::mandatory("M", 2),
            Session::elective("E1"),
            Session::elective("E2"),
            Session::elective("E3").with_speakers("J. Vos"),
        ];
        let mut advisors: Vec<Advisor> = (0..6)
            .map(|i| Advisor::new(format!("A{i}"), format!("Person {i}")).with_preferences(["E2", "E1"]))
            .collect();
        advisors.push(Advisor::new("V", "J. Vos"));
        let menu = vec![
            ScheduledInstance::new("M", "S1", "R1"),
            ScheduledInstance::new("E1", "S1", "R2"),
            ScheduledInstance::new("M", "S2", "R1"),
            ScheduledInstance::new("E2", "S2", "R2"),
            ScheduledInstance::new("E2", "S3", "R1"),
            ScheduledInstance::new("E3", "S3", "R2"),
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
    fn test_add_and_remove_keep_views_consistent() {
        let p = make_test_problem();
        let mut ind = Individual::empty(&p);
        assert_eq!(ind.add_gene(&p, 3, 0), None);
        assert_eq!(ind.add_gene(&p, 1, 0), None);
        assert_eq!(ind.attendees(0), &[1, 3]);
        // Replacing the slot-S1 gene moves the advisor
        assert_eq!(ind.add_gene(&p, 3, 1), Some(0));
        assert_eq!(ind.attendees(0), &[1]);
        assert_eq!(ind.attendees(1), &[3]);
        assert_eq!(ind.remove_gene(&p, 3, 0), Some(1));
        assert!(ind.attendees(1).is_empty());
        assert!(ind.is_consistent(&p));
        assert_eq!(ind.genome().gene_count(), 1);
    }

    #[test]
    fn test_presenter_takes_no_seat() {
        let p = make_test_problem();
        let mut ind = Individual::empty(&p);
        inject_obligations(&p, &mut ind);
        assert_eq!(ind.gene(6, 2), Some(5));
        assert_eq!(ind.attendees(5), &[6]);
        assert_eq!(ind.seat_load(&p, 5), 0);
    }

    #[test]
    fn test_random_individual() {
        let p = make_test_problem();
        let mut rng = SmallRng::seed_from_u64(42);
        let ind = random_individual(&p, &mut rng);
        assert!(ind.is_consistent(&p));
        // Obligation honoured
        assert_eq!(ind.gene(6, 2), Some(5));
        // Nobody attends a session twice
        for a in 0..p.advisor_count() {
            let mut sessions: Vec<usize> = ind
                .genome()
                .advisor_genes(a)
                .iter()
                .flatten()
                .map(|&i| p.session_of(i))
                .collect();
            let n = sessions.len();
            sessions.sort_unstable();
            sessions.dedup();
            assert_eq!(sessions.len(), n);
        }
        assert_eq!(ind.fitness, f64::NEG_INFINITY);
    }

    #[test]
    fn test_uniform_crossover() {
        let p = make_test_problem();
        let mut rng = SmallRng::seed_from_u64(7);
        let p1 = random_individual(&p, &mut rng);
        let p2 = random_individual(&p, &mut rng);
        let before = (p1.genome().clone(), p2.genome().clone());

        let child = uniform_crossover(&p, &p1, &p2, &mut rng);
        assert!(child.is_consistent(&p));
        for a in 0..p.advisor_count() {
            for slot in 0..p.slot_count() {
                let g = child.gene(a, slot);
                assert!(g == p1.gene(a, slot) || g == p2.gene(a, slot));
            }
        }
        // Parents untouched
        assert_eq!(&before.0, p1.genome());
        assert_eq!(&before.1, p2.genome());
    }

    #[test]
    fn test_mandatory_mutation_places_missing() {
        let p = make_test_problem();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut ind = Individual::empty(&p);
        ind.add_gene(&p, 0, 1); // E1 at S1
        for a in 1..p.advisor_count() {
            ind.add_gene(&p, a, 0);
        }
        assert!(mandatory_mutation(&p, &mut ind, &mut rng));
        assert!(ind.attends(&p, 0, 0));
        assert!(ind.is_consistent(&p));
        // Nothing left to fix
        assert!(!mandatory_mutation(&p, &mut ind, &mut rng));
    }

    #[test]
    fn test_capacity_mutation_moves_attendee() {
        let p = make_test_problem();
        let mut rng = SmallRng::seed_from_u64(3);
        let mut ind = Individual::empty(&p);
        for a in 0..6 {
            ind.add_gene(&p, a, 3); // six into E2@S2 (4 seats)
        }
        assert!(capacity_mutation(&p, &mut ind, &mut rng));
        assert_eq!(ind.attendees(3).len(), 5);
        assert_eq!(ind.attendees(2).len(), 1);
    }

    #[test]
    fn test_unfilled_mutation_fills_hole() {
        let p = make_test_problem();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut ind = Individual::empty(&p);
        inject_obligations(&p, &mut ind);
        let before = ind.genome().gene_count();
        assert!(unfilled_mutation(&p, &mut ind, &mut rng));
        assert_eq!(ind.genome().gene_count(), before + 1);
    }

    #[test]
    fn test_swap_mutation_preserves_loads() {
        let p = make_test_problem();
        let mut rng = SmallRng::seed_from_u64(11);
        let mut ind = Individual::empty(&p);
        for a in 0..3 {
            ind.add_gene(&p, a, 4); // E2@S3
        }
        for a in 3..6 {
            ind.add_gene(&p, a, 1); // E1@S1
            ind.add_gene(&p, a, 4);
        }
        // Only swaps between S3 holders exist and they share E2: nothing to do
        assert!(!swap_mutation(&p, &mut ind, &mut rng));

        let mut ind = Individual::empty(&p);
        ind.add_gene(&p, 0, 1); // A0: E1@S1
        ind.add_gene(&p, 1, 3); // A1: E2@S2
        ind.add_gene(&p, 0, 4); // A0: E2@S3
        ind.add_gene(&p, 1, 5); // A1: E3@S3
        let mut swapped = false;
        for _ in 0..50 {
            if swap_mutation(&p, &mut ind, &mut rng) {
                swapped = true;
                break;
            }
        }
        // S3 is the only slot both hold, and A1 already attends E2 at S2
        assert!(!swapped);
        assert_eq!(ind.attendees(4), &[0]);
    }
}
