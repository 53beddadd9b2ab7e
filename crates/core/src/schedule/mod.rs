//! Publication scheduling: slot calendar, durable schedule entries, and the
//! delivery worker that pushes finished videos out.

mod calendar;
mod delivery;
mod scheduler;
mod store;
mod types;

pub use calendar::*;
pub use delivery::*;
pub use scheduler::*;
pub use store::*;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Source {0} is already scheduled")]
    AlreadyScheduled(i64),

    #[error("Publication slot already taken: {0}")]
    SlotTaken(String),

    #[error("Schedule entry not found: {0}")]
    NotFound(i64),
}
