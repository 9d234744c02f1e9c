//! Fitness evaluation and schedule statistics.
//!
//! Higher fitness is better. Penalties are subtracted, preference matches
//! add a small reward. Weights are strictly ordered so that one fix of a
//! higher class always outweighs any change it causes in lower classes:
//!
//! | Defect | Default weight |
//! |--------|----------------|
//! | Missing required session, duplicate session | 1,000,000 each |
//! | Seat over capacity | 10,000 per seat |
//! | Unfilled slot | 100 per slot |
//! | Thin instance | 10 per instance |
//! | Preference match | +1 per match |

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::genome::Individual;
use super::problem::AgendaProblem;

/// Penalty and reward weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    /// Per required session an advisor misses.
    pub mandatory_missing: f64,
    /// Per duplicate session gene.
    pub duplicate: f64,
    /// Per seat over effective capacity.
    pub capacity_overflow: f64,
    /// Per slot without a gene or obligation.
    pub unfilled_slot: f64,
    /// Per non-empty instance below the attendance floor.
    pub thin_instance: f64,
    /// Reward per preferred session attended.
    pub preference_match: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            mandatory_missing: 1_000_000.0,
            duplicate: 1_000_000.0,
            capacity_overflow: 10_000.0,
            unfilled_slot: 100.0,
            thin_instance: 10.0,
            preference_match: 1.0,
        }
    }
}

impl FitnessWeights {
    /// Checks the strict ordering hard > capacity > unfilled > preference > 0,
    /// with the thin-instance weight below the unfilled one.
    pub fn validate(&self) -> Result<(), String> {
        let hard = self.mandatory_missing.min(self.duplicate);
        if !(hard > self.capacity_overflow
            && self.capacity_overflow > self.unfilled_slot
            && self.unfilled_slot > self.preference_match
            && self.preference_match > 0.0)
        {
            return Err(
                "fitness weights must satisfy mandatory/duplicate > capacity > unfilled > preference > 0"
                    .into(),
            );
        }
        if !(self.thin_instance >= 0.0 && self.thin_instance < self.unfilled_slot) {
            return Err("thin_instance weight must lie in [0, unfilled_slot)".into());
        }
        Ok(())
    }
}

/// Defect classes in decreasing severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefectClass {
    /// Some advisor misses a plenary or mandatory session.
    MandatoryMissing,
    /// Some instance holds more seats than it offers.
    CapacityViolation,
    /// Some advisor has an empty session slot.
    UnfilledSlot,
    /// No hard defect left.
    None,
}

/// Quality snapshot of an individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStats {
    /// Share of (advisor, required session) pairs satisfied, 0..=100.
    pub mandatory_met_percent: f64,
    /// Mean normalized preference satisfaction, 0..=100.
    pub preference_met_percent: f64,
    /// Instances over capacity.
    pub capacity_violations: usize,
    /// Seats over capacity, summed over instances.
    pub overflow_seats: usize,
    /// Empty slots summed over advisors.
    pub unfilled_slots: usize,
    /// Duplicate session genes.
    pub duplicates_found: usize,
    /// Non-empty instances below the minimum attendance.
    pub thin_instances: usize,
}

impl Default for ScheduleStats {
    fn default() -> Self {
        Self {
            mandatory_met_percent: 0.0,
            preference_met_percent: 0.0,
            capacity_violations: 0,
            overflow_seats: 0,
            unfilled_slots: 0,
            duplicates_found: 0,
            thin_instances: 0,
        }
    }
}

impl ScheduleStats {
    /// Every hard constraint holds.
    pub fn is_feasible(&self) -> bool {
        self.worst_defect() == DefectClass::None && self.duplicates_found == 0
    }

    /// Most severe outstanding defect class.
    pub fn worst_defect(&self) -> DefectClass {
        if self.mandatory_met_percent < 100.0 {
            DefectClass::MandatoryMissing
        } else if self.capacity_violations > 0 {
            DefectClass::CapacityViolation
        } else if self.unfilled_slots > 0 {
            DefectClass::UnfilledSlot
        } else {
            DefectClass::None
        }
    }
}

/// Scores an individual.
///
/// # Returns
/// `(fitness, stats)`; fitness is higher for better schedules.
pub fn evaluate(problem: &AgendaProblem, individual: &Individual) -> (f64, ScheduleStats) {
    let w = &problem.weights;
    let required = problem.required_sessions();
    let fillable = problem.fillable_elective_slots();

    let mut duplicates = 0usize;
    let mut missing = 0usize;
    let mut met = 0usize;
    let mut unfilled = 0usize;
    let mut matches = 0usize;
    let mut preference_sum = 0.0;
    let mut preference_n = 0usize;

    for a in 0..problem.advisor_count() {
        // session → (regular genes, presented)
        let mut held: HashMap<usize, (usize, bool)> = HashMap::new();
        let mut covered = 0usize;
        for slot in 0..problem.slot_count() {
            let obligation = problem.obligation(a, slot);
            match individual.gene(a, slot) {
                Some(i) => {
                    covered += 1;
                    let entry = held.entry(problem.session_of(i)).or_insert((0, false));
                    if obligation == Some(i) {
                        entry.1 = true;
                    } else {
                        entry.0 += 1;
                    }
                }
                None if obligation.is_some() => covered += 1,
                None => {}
            }
        }

        for &(regular, presented) in held.values() {
            duplicates += if presented {
                regular
            } else {
                regular.saturating_sub(1)
            };
        }
        for r in required {
            if held.contains_key(r) {
                met += 1;
            } else {
                missing += 1;
            }
        }

        let matched = held
            .keys()
            .filter(|&&s| problem.rank(a, s).is_some())
            .count();
        matches += matched;
        let denominator = problem.preference_count(a).min(fillable);
        if denominator > 0 {
            preference_sum += matched.min(denominator) as f64 / denominator as f64;
            preference_n += 1;
        }

        unfilled += problem.slot_count() - covered;
    }

    let mut violations = 0usize;
    let mut overflow = 0usize;
    let mut thin = 0usize;
    for (i, info) in problem.instances.iter().enumerate() {
        let load = individual.seat_load(problem, i);
        if load > info.capacity {
            violations += 1;
            overflow += load - info.capacity;
        }
        let listed = individual.attendees(i).len();
        if listed > 0 && listed < problem.min_attendance {
            thin += 1;
        }
    }

    let pairs = problem.advisor_count() * required.len();
    let stats = ScheduleStats {
        mandatory_met_percent: if pairs == 0 {
            100.0
        } else {
            met as f64 * 100.0 / pairs as f64
        },
        preference_met_percent: if preference_n == 0 {
            100.0
        } else {
            preference_sum * 100.0 / preference_n as f64
        },
        capacity_violations: violations,
        overflow_seats: overflow,
        unfilled_slots: unfilled,
        duplicates_found: duplicates,
        thin_instances: thin,
    };

    let fitness = matches as f64 * w.preference_match
        - missing as f64 * w.mandatory_missing
        - duplicates as f64 * w.duplicate
        - overflow as f64 * w.capacity_overflow
        - unfilled as f64 * w.unfilled_slot
        - thin as f64 * w.thin_instance;

    (fitness, stats)
}
