//! Agenda domain models.
//!
//! Static inputs (rooms, slots, sessions, advisors) are loaded once and never
//! mutated. `ScheduledInstance` is the output unit: a session placed in a room
//! at a slot, together with the advisors attending it.
//!
//! # Domain Mappings
//!
//! | u-agenda | Conference | Training Day | Trade Fair |
//! |----------|------------|--------------|------------|
//! | Room | Hall/Breakout | Classroom | Stage |
//! | TimeSlot | Program block | Period | Time window |
//! | Session | Talk/Workshop | Course | Presentation |
//! | Advisor | Attendee | Trainee | Visitor |

mod advisor;
mod instance;
mod room;
mod session;
mod slot;

pub use advisor::Advisor;
pub use instance::{FixedPlacement, ScheduledInstance};
pub use room::Room;
pub use session::{Session, SessionType};
pub use slot::{session_slots, DayPeriod, SlotKind, TimeSlot};
