//! Types for the orchestrator.

use serde::Serialize;

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrchestratorStatus {
    /// Whether the loops are running.
    pub running: bool,
    /// Productions currently being synthesized (0 or 1 in practice).
    pub in_flight: usize,
    /// Queue records waiting for production.
    pub pending_count: u64,
    /// Finished productions.
    pub done_count: u64,
    /// Productions that ended in failure.
    pub failed_count: u64,
}
