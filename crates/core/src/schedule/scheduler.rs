//! Slot assignment for finished videos.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::{ScheduleError, ScheduleStore, SlotCalendar};

/// Assigns each finished video its publication slot.
pub struct Scheduler {
    store: Arc<dyn ScheduleStore>,
    calendar: SlotCalendar,
}

impl Scheduler {
    pub fn new(store: Arc<dyn ScheduleStore>, calendar: SlotCalendar) -> Self {
        Self { store, calendar }
    }

    /// Book the next free slot for `source_id`. Rejects sources that already
    /// hold an entry.
    pub fn schedule_upload(&self, source_id: i64) -> Result<DateTime<Utc>, ScheduleError> {
        self.schedule_upload_at(source_id, Utc::now())
    }

    pub fn schedule_upload_at(
        &self,
        source_id: i64,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        if self.store.get_by_source(source_id)?.is_some() {
            return Err(ScheduleError::AlreadyScheduled(source_id));
        }

        let taken = self.store.scheduled_times()?;
        let slot = self.calendar.next_slot(now, &taken);
        let entry = self.store.insert(source_id, slot)?;

        info!(
            source_id,
            scheduled_time = %entry.scheduled_time,
            "Scheduled upload"
        );
        Ok(entry.scheduled_time)
    }
}
