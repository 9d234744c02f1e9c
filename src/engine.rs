//! End-to-end assignment pipeline.
//!
//! # Stages
//!
//! | Stage | Component |
//! |-------|-----------|
//! | Validate input and configuration | [`crate::validation`] |
//! | Build the menu of instances | [`MasterScheduleGenerator`] |
//! | Derive presenter obligations | [`build_obligations`] |
//! | Search attendee assignments | [`GaRunner`] |
//! | Final repair until stable | [`Repairer::repair_until_stable`] |
//! | Backfill or empty thin instances | [`Repairer::consolidate`] |
//!
//! One seeded `SmallRng` drives every random choice of a run, so equal seeds
//! give equal results.

use std::time::Instant;

use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::capacity::VenueRules;
use crate::config::AgendaConfig;
use crate::error::AgendaError;
use crate::ga::{AgendaProblem, GaRunner, Progress, Repairer, ScheduleStats, Termination};
use crate::models::{Advisor, FixedPlacement, Room, ScheduledInstance, Session, SessionType, TimeSlot};
use crate::placement::MasterScheduleGenerator;
use crate::presenters::{build_obligations, PresenterObligations};
use crate::validation::{validate_input, validate_venue};

/// Everything the ingestion layer provides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaInput {
    /// Venue rooms.
    pub rooms: Vec<Room>,
    /// Two-day grid, including non-session blocks.
    pub slots: Vec<TimeSlot>,
    /// Session catalogue.
    pub sessions: Vec<Session>,
    /// Roster with preferences.
    pub advisors: Vec<Advisor>,
    /// Placements decided outside the engine.
    pub fixed: Vec<FixedPlacement>,
}

/// Output of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaResult {
    /// Menu with settled attendee lists.
    pub instances: Vec<ScheduledInstance>,
    /// Quality snapshot of the final assignment.
    pub stats: ScheduleStats,
    /// Final fitness.
    pub fitness: f64,
    /// GA generations completed.
    pub generations: usize,
    /// Why the GA stopped.
    pub termination: Termination,
    /// Repair passes spent after the GA.
    pub repair_attempts: usize,
    /// Presenter obligations honoured by the assignment.
    pub obligations: PresenterObligations,
    /// Wall-clock time of the run.
    pub elapsed_ms: u64,
}

/// Validated input plus configuration, ready to run.
///
/// # Example
/// ```
/// use u_agenda::config::AgendaConfig;
/// use u_agenda::engine::{AgendaEngine, AgendaInput};
/// use u_agenda::ga::GaConfig;
/// use u_agenda::models::{Advisor, Room, Session, TimeSlot};
///
/// let input = AgendaInput {
///     rooms: vec![Room::new("R1", 20), Room::new("R2", 10)],
///     slots: vec![TimeSlot::new("S1", 1), TimeSlot::new("S2", 1).with_start_minute(660)],
///     sessions: vec![Session::mandatory("M", 1), Session::elective("E1"), Session::elective("E2")],
///     advisors: (0..8).map(|i| Advisor::new(format!("A{i}"), format!("Advisor {i}"))).collect(),
///     fixed: vec![],
/// };
/// let config = AgendaConfig::default().with_ga(GaConfig::default().with_seed(1));
/// let result = AgendaEngine::new(input, config).unwrap().run();
/// assert_eq!(result.stats.mandatory_met_percent, 100.0);
/// ```
#[derive(Debug, Clone)]
pub struct AgendaEngine {
    input: AgendaInput,
    config: AgendaConfig,
}

impl AgendaEngine {
    /// Validates input and configuration.
    ///
    /// When no plenary room is configured and the catalogue has a plenary,
    /// the largest room becomes the plenary room.
    pub fn new(input: AgendaInput, mut config: AgendaConfig) -> Result<Self, AgendaError> {
        config.validate()?;
        validate_input(
            &input.rooms,
            &input.slots,
            &input.sessions,
            &input.advisors,
            &input.fixed,
        )
        .map_err(AgendaError::InvalidInput)?;
        validate_venue(&config.venue, &config.placement, &input.rooms, &input.slots)
            .map_err(AgendaError::InvalidInput)?;

        config.venue = resolve_plenary_room(config.venue, &input);
        Ok(Self { input, config })
    }

    /// Effective configuration.
    pub fn config(&self) -> &AgendaConfig {
        &self.config
    }

    /// Runs the pipeline without progress reporting.
    pub fn run(&self) -> AgendaResult {
        self.run_with_progress(|_| {})
    }

    /// Runs the pipeline; `observer` is called once per GA generation.
    pub fn run_with_progress<F>(&self, observer: F) -> AgendaResult
    where
        F: FnMut(&Progress<'_>),
    {
        let start = Instant::now();
        let input = &self.input;
        let config = &self.config;
        let mut rng = match config.ga.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };

        info!(
            "Agenda run: {} advisors, {} sessions, {} rooms, {} slots",
            input.advisors.len(),
            input.sessions.len(),
            input.rooms.len(),
            input.slots.len()
        );

        let generator = MasterScheduleGenerator::new(
            &input.rooms,
            &input.slots,
            &input.sessions,
            &input.advisors,
            &config.venue,
            &config.placement,
        );
        let menu = generator.generate(&input.fixed, &mut rng);
        let obligations = build_obligations(&input.sessions, &input.advisors, &menu);
        info!("{} presenter obligations", obligations.len());

        let problem = AgendaProblem::new(
            &input.rooms,
            &input.slots,
            &input.sessions,
            &input.advisors,
            &menu,
            &obligations,
            &config.venue,
        )
        .with_weights(config.weights.clone())
        .with_min_attendance(config.placement.min_attendance);

        let ga = GaRunner::new(&problem, &config.ga).run(&mut rng, observer);
        let mut best = ga.best;
        let repairer = Repairer::new(&problem);
        let outcome = repairer.repair_until_stable(&mut best, config.ga.final_repair_attempts);
        if repairer.consolidate(&mut best) {
            info!("Thin instances after consolidation: {}", best.stats.thin_instances);
        }
        info!(
            "Final repair: {} attempts, feasible={}, mandatory={:.1}%, capacity violations={}, preferences={:.1}%",
            outcome.attempts,
            outcome.feasible,
            best.stats.mandatory_met_percent,
            best.stats.capacity_violations,
            best.stats.preference_met_percent
        );

        AgendaResult {
            instances: problem.materialize(&best),
            stats: best.stats.clone(),
            fitness: best.fitness,
            generations: ga.generations,
            termination: ga.termination,
            repair_attempts: outcome.attempts,
            obligations,
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    }
}

fn resolve_plenary_room(mut rules: VenueRules, input: &AgendaInput) -> VenueRules {
    let has_plenary = input
        .sessions
        .iter()
        .any(|s| s.session_type == SessionType::Plenary);
    if rules.plenary_room.is_none() && has_plenary {
        rules.plenary_room = input
            .rooms
            .iter()
            .max_by_key(|r| r.capacity)
            .map(|r| r.id.clone());
    }
    rules
}
