use thiserror::Error;

use super::types::{EnsureOutcome, NewProduction, ProductionRecord, ProductionStatus};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Production record not found: {0}")]
    NotFound(i64),
}

/// Persistence for production records.
///
/// A source article may accumulate several records over time; only the
/// most-recent one (highest priority, then newest id) is authoritative.
pub trait QueueStore: Send + Sync {
    /// Guarantee the source has a usable record: PENDING and DONE are left
    /// alone, FAILED is flipped back to PENDING (verdict gate preserved),
    /// absence inserts a fresh PENDING record from `defaults`.
    fn ensure_ready(&self, defaults: &NewProduction) -> Result<EnsureOutcome, QueueError>;

    /// Insert a fresh PENDING record unless a non-FAILED one already exists.
    /// Returns true when a record was inserted.
    fn enqueue(&self, new: &NewProduction) -> Result<bool, QueueError>;

    /// Pop the next workable record: PENDING with a passing verdict gate,
    /// highest priority first, then highest quality score.
    fn dequeue_next(&self) -> Result<Option<ProductionRecord>, QueueError>;

    /// The authoritative record for a source, if any.
    fn latest(&self, source_id: i64) -> Result<Option<ProductionRecord>, QueueError>;

    /// Fetch a record by id.
    fn get(&self, record_id: i64) -> Result<ProductionRecord, QueueError>;

    /// Terminal success: store artifact paths and stamp completion.
    fn mark_done(
        &self,
        record_id: i64,
        video_path: &str,
        thumbnail_path: &str,
    ) -> Result<(), QueueError>;

    /// Terminal failure with a diagnostic reason.
    fn mark_failed(&self, record_id: i64, reason: &str) -> Result<(), QueueError>;

    /// Source ids with a PENDING or DONE record (used to exclude candidates).
    fn active_source_ids(&self) -> Result<Vec<i64>, QueueError>;

    /// Source ids with a DONE record (used to seed the dedup corpus).
    fn done_source_ids(&self) -> Result<Vec<i64>, QueueError>;

    /// Number of records in the given status.
    fn count_by_status(&self, status: ProductionStatus) -> Result<u64, QueueError>;

    /// Newest records first.
    fn list(&self, limit: usize) -> Result<Vec<ProductionRecord>, QueueError>;
}
