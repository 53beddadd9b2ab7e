//! Per-process concurrency guard for synthesis.
//!
//! At most one synthesis per source id within this process. Does not
//! coordinate across processes; deployment runs a single worker.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::SynthesisError;

/// Mutex-protected set of source ids currently in synthesis.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    in_flight: Mutex<HashSet<i64>>,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `source_id`. Fails with `Conflict` when a synthesis for the same
    /// id already holds a permit.
    pub fn acquire(self: &Arc<Self>, source_id: i64) -> Result<SynthesisPermit, SynthesisError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(source_id) {
            return Err(SynthesisError::Conflict(source_id));
        }
        Ok(SynthesisPermit {
            registry: Arc::clone(self),
            source_id,
        })
    }

    pub fn is_in_flight(&self, source_id: i64) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&source_id)
    }

    pub fn active_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn release(&self, source_id: i64) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&source_id);
    }
}

/// Ownership token for one in-flight synthesis. Releases its id when dropped,
/// on every exit path.
#[derive(Debug)]
pub struct SynthesisPermit {
    registry: Arc<InFlightRegistry>,
    source_id: i64,
}

impl SynthesisPermit {
    pub fn source_id(&self) -> i64 {
        self.source_id
    }
}

impl Drop for SynthesisPermit {
    fn drop(&mut self) {
        self.registry.release(self.source_id);
    }
}
