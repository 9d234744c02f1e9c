//! Conference agenda assignment engine.
//!
//! Places sessions into rooms and time slots, then decides which advisor
//! attends which instance so that everyone attends every plenary and
//! mandatory session exactly once, no room is over capacity, no slot is left
//! empty and elective preferences are met as far as possible.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Room`, `TimeSlot`, `Session`, `Advisor`,
//!   `ScheduledInstance`, `FixedPlacement`
//! - **`validation`**: Input integrity checks (duplicate IDs, unknown references, plenary count)
//! - **`capacity`**: Effective seat capacity under venue rules
//! - **`presenters`**: Speaker-text matching and presenter obligations
//! - **`placement`**: Master schedule (menu of instances)
//! - **`ga`**: Genome encoding, fitness, repair and the GA loop
//! - **`config`**: Run configuration and TOML loading
//! - **`engine`**: End-to-end pipeline
//!
//! # Architecture
//!
//! ```text
//! input ─▶ validation ─▶ placement ─▶ presenters ─▶ ga (search + repair) ─▶ result
//! ```
//!
//! The menu is frozen once placement finishes; optimization only changes
//! attendee lists. All randomness flows from one seeded generator per run.
//!
//! # References
//!
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"
//! - Moscato (1989), "Towards Memetic Algorithms"

pub mod capacity;
pub mod config;
pub mod engine;
pub mod error;
pub mod ga;
pub mod models;
pub mod placement;
pub mod presenters;
pub mod validation;

pub use config::AgendaConfig;
pub use engine::{AgendaEngine, AgendaInput, AgendaResult};
pub use error::AgendaError;
