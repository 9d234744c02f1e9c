//! Generational GA loop with a memetic repair step.
//!
//! # Generation
//!
//! 1. Elites are copied unchanged.
//! 2. The rest is bred: tournament selection, crossover with probability
//!    `crossover_rate`, defect-driven mutation with the current (adaptive)
//!    mutation rate.
//! 3. The top `local_search_top_k` individuals get one repair pass and are
//!    re-scored.
//! 4. The population is ranked by fitness.
//!
//! The loop stops as soon as the best individual is feasible, at the
//! generation cap, or when the wall-clock budget runs out.

use std::time::{Duration, Instant};

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::GaConfig;
use super::fitness::ScheduleStats;
use super::genome::{random_individual, Individual};
use super::operators::GeneticOperators;
use super::problem::AgendaProblem;
use super::repair::Repairer;

/// Factor applied to the mutation rate after a stagnation window.
const MUTATION_BOOST: f64 = 1.5;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The best individual satisfies every hard constraint.
    Feasible,
    /// `max_generations` reached.
    GenerationCap,
    /// Wall-clock budget exhausted.
    TimeBudget,
}

/// Snapshot handed to the progress observer once per generation.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Generations completed.
    pub generation: usize,
    /// Generation budget.
    pub max_generations: usize,
    /// Best fitness so far.
    pub best_fitness: f64,
    /// Stats of the best individual so far.
    pub stats: &'a ScheduleStats,
}

/// Outcome of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// Best individual found.
    pub best: Individual,
    /// Generations completed.
    pub generations: usize,
    /// Stop reason.
    pub termination: Termination,
}

/// GA driver over one [`AgendaProblem`].
pub struct GaRunner<'a> {
    problem: &'a AgendaProblem,
    config: &'a GaConfig,
    operators: GeneticOperators,
    repairer: Repairer<'a>,
}

impl<'a> GaRunner<'a> {
    /// Creates a runner.
    pub fn new(problem: &'a AgendaProblem, config: &'a GaConfig) -> Self {
        Self {
            problem,
            config,
            operators: GeneticOperators::default(),
            repairer: Repairer::new(problem),
        }
    }

    /// Replaces the genetic operators.
    pub fn with_operators(mut self, operators: GeneticOperators) -> Self {
        self.operators = operators;
        self
    }

    /// Random, scored and ranked starting population.
    pub fn initial_population<R: Rng>(&self, rng: &mut R) -> Vec<Individual> {
        let mut population: Vec<Individual> = (0..self.config.population_size)
            .map(|_| {
                let mut ind = random_individual(self.problem, rng);
                ind.evaluate(self.problem);
                ind
            })
            .collect();
        self.local_search(&mut population);
        population
    }

    /// Breeds the next generation from a ranked population.
    ///
    /// Takes the population by value and returns the successor, ranked best
    /// first. Parents are never modified.
    pub fn next_generation<R: Rng>(
        &self,
        population: Vec<Individual>,
        mutation_rate: f64,
        rng: &mut R,
    ) -> Vec<Individual> {
        let size = self.config.population_size;
        let elites = self.config.elite_count().max(1).min(population.len());
        let mut next: Vec<Individual> = population[..elites].to_vec();

        while next.len() < size {
            let p1 = self.tournament(&population, rng);
            let p2 = self.tournament(&population, rng);
            let mut child = if rng.random_bool(self.config.crossover_rate) {
                self.operators.crossover(self.problem, p1, p2, rng)
            } else {
                p1.clone()
            };
            if rng.random_bool(mutation_rate.clamp(0.0, 1.0)) {
                self.operators.mutate(self.problem, &mut child, rng);
            }
            if child.fitness == f64::NEG_INFINITY {
                child.evaluate(self.problem);
            }
            next.push(child);
        }

        self.local_search(&mut next);
        next
    }

    /// Runs the loop to completion.
    ///
    /// `observer` is called after every generation.
    pub fn run<R, F>(&self, rng: &mut R, mut observer: F) -> GaResult
    where
        R: Rng,
        F: FnMut(&Progress<'_>),
    {
        let start = Instant::now();
        let budget = self.config.time_budget_ms.map(Duration::from_millis);
        let max_generations = self.config.max_generations;

        let mut population = self.initial_population(rng);
        let mut best = population[0].clone();
        let mut mutation_rate = self.config.mutation_rate;
        let mut stagnant = 0usize;
        let mut generations = 0usize;

        let termination = loop {
            if best.stats.is_feasible() {
                break Termination::Feasible;
            }
            if generations >= max_generations {
                break Termination::GenerationCap;
            }
            if budget.is_some_and(|b| start.elapsed() >= b) {
                break Termination::TimeBudget;
            }

            population = self.next_generation(population, mutation_rate, rng);
            generations += 1;

            if population[0].fitness > best.fitness {
                best = population[0].clone();
                stagnant = 0;
                mutation_rate = self.config.mutation_rate;
            } else {
                stagnant += 1;
                let window = self.config.stagnation_window;
                if window > 0 && stagnant % window == 0 {
                    mutation_rate = (mutation_rate * MUTATION_BOOST).min(self.config.max_mutation_rate);
                    debug!("No improvement for {stagnant} generations; mutation rate now {mutation_rate:.3}");
                }
            }

            debug!("Gen {generations}: best fitness={:.1}", best.fitness);
            if generations % 10 == 0 {
                info!(
                    "Gen {}/{}: mandatory={:.1}% preference={:.1}% capacity violations={} unfilled={}",
                    generations,
                    max_generations,
                    best.stats.mandatory_met_percent,
                    best.stats.preference_met_percent,
                    best.stats.capacity_violations,
                    best.stats.unfilled_slots
                );
            }
            observer(&Progress {
                generation: generations,
                max_generations,
                best_fitness: best.fitness,
                stats: &best.stats,
            });
        };

        info!("GA stopped after {generations} generations: {termination:?}");
        GaResult {
            best,
            generations,
            termination,
        }
    }

    fn tournament<'p, R: Rng>(&self, population: &'p [Individual], rng: &mut R) -> &'p Individual {
        // Ranked population: the lowest index is the fittest contestant
        let winner = (0..self.config.tournament_size.max(1))
            .map(|_| rng.random_range(0..population.len()))
            .min()
            .unwrap_or(0);
        &population[winner]
    }

    /// Repairs the top individuals once, then ranks the whole population.
    fn local_search(&self, population: &mut [Individual]) {
        rank(population);
        let k = self.config.local_search_top_k.min(population.len());
        for ind in &mut population[..k] {
            self.repairer.repair_until_stable(ind, 1);
        }
        rank(population);
    }
}

/// Sorts best first; ties keep their order.
fn rank(population: &mut [Individual]) {
    population.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::VenueRules;
    use crate::models::{Advisor, Room, ScheduledInstance, Session, TimeSlot};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn make_test_problem() -> AgendaProblem {
        let rooms = vec![Room::new("R1", 20), Room::new("R2", 10), Room::new("R3", 10)];
        let slots = vec![
            TimeSlot::new("S1", 1).with_start_minute(540),
            TimeSlot::new("S2", 1).with_start_minute(660),
            TimeSlot::new("S3", 2).with_start_minute(540),
        ];
        let sessions = vec![
            Session::mandatory("M", 2),
            Session::elective("E1"),
            Session::elective("E2"),
            Session::elective("E3"),
        ];
        let advisors: Vec<Advisor> = (0..15)
            .map(|i| {
                let prefs = match i % 3 {
                    0 => ["E1", "E2", "E3"],
                    1 => ["E2", "E3", "E1"],
                    _ => ["E3", "E1", "E2"],
                };
                Advisor::new(format!("A{i}"), format!("Person {i}")).with_preferences(prefs)
            })
            .collect();
        let menu = vec![
            ScheduledInstance::new("M", "S1", "R1"),
            ScheduledInstance::new("E1", "S1", "R2"),
            ScheduledInstance::new("M", "S2", "R1"),
            ScheduledInstance::new("E2", "S2", "R2"),
            ScheduledInstance::new("E3", "S2", "R3"),
            ScheduledInstance::new("E1", "S3", "R1"),
            ScheduledInstance::new("E2", "S3", "R2"),
            ScheduledInstance::new("E3", "S3", "R3"),
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

    fn small_config() -> GaConfig {
        GaConfig::default()
            .with_population_size(20)
            .with_max_generations(50)
            .with_local_search_top_k(5)
    }

    #[test]
    fn test_initial_population_ranked() {
        let p = make_test_problem();
        let config = small_config();
        let runner = GaRunner::new(&p, &config);
        let mut rng = SmallRng::seed_from_u64(42);
        let pop = runner.initial_population(&mut rng);
        assert_eq!(pop.len(), 20);
        assert!(pop.windows(2).all(|w| w[0].fitness >= w[1].fitness));
        assert!(pop.iter().all(|ind| ind.fitness > f64::NEG_INFINITY));
    }

    #[test]
    fn test_next_generation_keeps_elite() {
        let p = make_test_problem();
        let config = small_config().with_local_search_top_k(0);
        let runner = GaRunner::new(&p, &config);
        let mut rng = SmallRng::seed_from_u64(7);
        let pop = runner.initial_population(&mut rng);
        let best = pop[0].fitness;
        let next = runner.next_generation(pop, 0.3, &mut rng);
        assert_eq!(next.len(), 20);
        assert!(next[0].fitness >= best);
        assert!(next.iter().all(|ind| ind.is_consistent(&p)));
    }

    #[test]
    fn test_run_reaches_feasibility() {
        let p = make_test_problem();
        let config = small_config();
        let runner = GaRunner::new(&p, &config);
        let mut rng = SmallRng::seed_from_u64(42);
        let mut calls = 0;
        let result = runner.run(&mut rng, |progress| {
            assert!(progress.generation <= progress.max_generations);
            calls += 1;
        });
        assert_eq!(result.termination, Termination::Feasible);
        assert!(result.best.stats.is_feasible());
        assert_eq!(calls, result.generations);
    }

    #[test]
    fn test_seed_determinism() {
        let p = make_test_problem();
        let config = small_config().with_max_generations(5);
        let runner = GaRunner::new(&p, &config);
        let a = runner.run(&mut SmallRng::seed_from_u64(3), |_| {});
        let b = runner.run(&mut SmallRng::seed_from_u64(3), |_| {});
        assert_eq!(a.best.genome(), b.best.genome());
        assert_eq!(a.generations, b.generations);
    }
}
