//! GA configuration.
//!
//! [`GaConfig`] holds every parameter that controls the evolutionary loop.

use serde::{Deserialize, Serialize};

/// Configuration for the agenda GA.
///
/// # Defaults
///
/// ```
/// use u_agenda::ga::GaConfig;
///
/// let config = GaConfig::default();
/// assert_eq!(config.population_size, 60);
/// assert_eq!(config.max_generations, 300);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_agenda::ga::GaConfig;
///
/// let config = GaConfig::default()
///     .with_population_size(100)
///     .with_tournament_size(4)
///     .with_mutation_rate(0.2)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Number of individuals in the population.
    pub population_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Fraction of the population copied unchanged (0.0–1.0).
    pub elite_ratio: f64,

    /// Contestants per tournament.
    pub tournament_size: usize,

    /// Probability of crossing two parents (0.0–1.0).
    ///
    /// Without crossover the child is a clone of the first parent.
    pub crossover_rate: f64,

    /// Base probability of mutating a child (0.0–1.0).
    pub mutation_rate: f64,

    /// Ceiling for the adaptive mutation rate.
    pub max_mutation_rate: f64,

    /// Generations without improvement before the mutation rate is raised.
    ///
    /// Set to 0 to keep the rate fixed.
    pub stagnation_window: usize,

    /// Individuals repaired per generation by the memetic step.
    pub local_search_top_k: usize,

    /// Wall-clock budget in milliseconds. `None` runs until the generation cap.
    pub time_budget_ms: Option<u64>,

    /// Repair passes allowed after the loop ends.
    pub final_repair_attempts: usize,

    /// Random seed for reproducibility.
    ///
    /// `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 60,
            max_generations: 300,
            elite_ratio: 0.1,
            tournament_size: 3,
            crossover_rate: 0.9,
            mutation_rate: 0.15,
            max_mutation_rate: 0.6,
            stagnation_window: 20,
            local_search_top_k: 5,
            time_budget_ms: None,
            final_repair_attempts: 25,
            seed: None,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the elite ratio.
    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, n: usize) -> Self {
        self.tournament_size = n;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the base mutation rate.
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the adaptive mutation ceiling.
    pub fn with_max_mutation_rate(mut self, rate: f64) -> Self {
        self.max_mutation_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Sets the stagnation window (0 to disable adaptation).
    pub fn with_stagnation_window(mut self, n: usize) -> Self {
        self.stagnation_window = n;
        self
    }

    /// Sets how many top individuals the memetic step repairs.
    pub fn with_local_search_top_k(mut self, k: usize) -> Self {
        self.local_search_top_k = k;
        self
    }

    /// Sets the wall-clock budget.
    pub fn with_time_budget_ms(mut self, ms: u64) -> Self {
        self.time_budget_ms = Some(ms);
        self
    }

    /// Sets the final repair attempt cap.
    pub fn with_final_repair_attempts(mut self, n: usize) -> Self {
        self.final_repair_attempts = n;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of elites per generation.
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.elite_ratio) as usize
    }

    /// Validates the configuration.
    ///
    /// Returns `Err` with a description if any parameter is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.elite_count() >= self.population_size {
            return Err("elite_ratio too high: elites fill entire population".into());
        }
        if self.tournament_size == 0 {
            return Err("tournament_size must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) || !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err("crossover_rate and mutation_rate must lie in 0.0..=1.0".into());
        }
        if self.max_mutation_rate < self.mutation_rate || self.max_mutation_rate > 1.0 {
            return Err("max_mutation_rate must lie between mutation_rate and 1.0".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GaConfig::default();
        assert_eq!(config.population_size, 60);
        assert_eq!(config.max_generations, 300);
        assert_eq!(config.tournament_size, 3);
        assert!((config.elite_ratio - 0.1).abs() < 1e-10);
        assert!((config.crossover_rate - 0.9).abs() < 1e-10);
        assert!((config.mutation_rate - 0.15).abs() < 1e-10);
        assert_eq!(config.local_search_top_k, 5);
        assert!(config.time_budget_ms.is_none());
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = GaConfig::default()
            .with_population_size(200)
            .with_max_generations(1000)
            .with_elite_ratio(0.2)
            .with_tournament_size(5)
            .with_crossover_rate(0.8)
            .with_mutation_rate(0.05)
            .with_max_mutation_rate(0.5)
            .with_stagnation_window(10)
            .with_local_search_top_k(3)
            .with_time_budget_ms(2_000)
            .with_final_repair_attempts(50)
            .with_seed(42);

        assert_eq!(config.population_size, 200);
        assert_eq!(config.max_generations, 1000);
        assert_eq!(config.elite_count(), 40);
        assert_eq!(config.tournament_size, 5);
        assert!((config.crossover_rate - 0.8).abs() < 1e-10);
        assert!((config.mutation_rate - 0.05).abs() < 1e-10);
        assert_eq!(config.stagnation_window, 10);
        assert_eq!(config.local_search_top_k, 3);
        assert_eq!(config.time_budget_ms, Some(2_000));
        assert_eq!(config.final_repair_attempts, 50);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_rates_clamped() {
        let config = GaConfig::default()
            .with_crossover_rate(1.5)
            .with_mutation_rate(-0.3);
        assert!((config.crossover_rate - 1.0).abs() < 1e-10);
        assert!(config.mutation_rate.abs() < 1e-10);
    }

    #[test]
    fn test_validate_rejects() {
        assert!(GaConfig::default().with_population_size(1).validate().is_err());
        assert!(GaConfig::default().with_max_generations(0).validate().is_err());
        assert!(GaConfig::default().with_elite_ratio(1.0).validate().is_err());
        assert!(GaConfig::default().with_tournament_size(0).validate().is_err());
        assert!(GaConfig::default()
            .with_mutation_rate(0.5)
            .with_max_mutation_rate(0.2)
            .validate()
            .is_err());
    }
}
