//! Genetic search over attendee assignments.
//!
//! The master schedule (menu of instances) is frozen before the search
//! starts; the GA only decides who attends which instance.
//!
//! # Encoding
//!
//! - **Genome**: advisor × session-slot matrix of instance indices.
//! - **Individual**: genome plus per-instance sorted attendee lists, kept in
//!   step by a single mutation API ([`Individual::add_gene`],
//!   [`Individual::remove_gene`]).
//!
//! # Submodules
//!
//! - [`operators`]: crossover and defect-driven mutation
//!
//! # Pipeline per generation
//!
//! Selection → crossover → mutation → scoring → repair of the top-K
//! (memetic step) → ranking. See [`GaRunner`].
//!
//! # Reference
//! - Moscato (1989), "On Evolution, Search, Optimization, Genetic Algorithms
//!   and Martial Arts: Towards Memetic Algorithms"
//! - Coello (2002), "Theoretical and numerical constraint-handling techniques
//!   used with evolutionary algorithms"

mod config;
mod fitness;
mod genome;
pub mod operators;
mod problem;
mod repair;
mod runner;

pub use config::GaConfig;
pub use fitness::{evaluate, DefectClass, FitnessWeights, ScheduleStats};
pub use genome::{
    capacity_mutation, inject_obligations, mandatory_mutation, random_individual, swap_mutation,
    uniform_crossover, unfilled_mutation, viable_instances, Genome, Individual,
};
pub use problem::{AgendaProblem, InstanceInfo};
pub use repair::{RepairOutcome, Repairer};
pub use runner::{GaResult, GaRunner, Progress, Termination};
