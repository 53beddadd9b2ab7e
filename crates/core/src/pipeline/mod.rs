//! Production pipeline: the concurrency guard and the synthesizer that runs
//! one article through script, narration, composition, and finalization.

mod guard;
mod synthesizer;

pub use guard::*;
pub use synthesizer::*;

use thiserror::Error;

use crate::queue::QueueError;
use crate::repository::RepositoryError;
use crate::schedule::ScheduleError;

/// Failure classes of one production run.
///
/// Every variant except `Conflict` resolves the backing record to FAILED
/// with the error message as diagnostic.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Production already in flight for source {0}")]
    Conflict(i64),

    #[error("Script validation failed: {0}")]
    Validation(String),

    #[error("Transient service failure: {0}")]
    Transient(String),

    #[error("Data integrity failure: {0}")]
    Integrity(String),

    #[error("No production possible for source {0}: not found")]
    NotFound(i64),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),
}
