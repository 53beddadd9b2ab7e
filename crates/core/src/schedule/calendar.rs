//! Fixed publication slot calendar.
//!
//! All slot arithmetic happens in one fixed-offset timezone; stored and
//! returned timestamps are UTC.

use chrono::{DateTime, Datelike, Days, FixedOffset, LocalResult, Offset, TimeZone, Utc};

/// Weekday publication times, (hour, minute) local.
const WEEKDAY_SLOTS: [(u32, u32); 4] = [(7, 30), (12, 0), (18, 30), (21, 0)];
/// Weekend publication times.
const WEEKEND_SLOTS: [(u32, u32); 3] = [(10, 0), (15, 0), (20, 0)];

/// Days scanned forward before giving up on finding a free slot.
const MAX_LOOKAHEAD_DAYS: u64 = 30;

#[derive(Debug, Clone)]
pub struct SlotCalendar {
    offset: FixedOffset,
    daily_cap: usize,
}

impl SlotCalendar {
    pub fn new(utc_offset_hours: i32, daily_cap: usize) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix());
        Self {
            offset,
            daily_cap: daily_cap.max(1),
        }
    }

    fn slots_for(date: chrono::NaiveDate) -> &'static [(u32, u32)] {
        if date.weekday().num_days_from_monday() >= 5 {
            &WEEKEND_SLOTS
        } else {
            &WEEKDAY_SLOTS
        }
    }

    /// First free future slot given the already-taken timestamps.
    ///
    /// Today's remaining slots are scanned in order, skipping any slot in the
    /// past or already taken; days at the daily cap are skipped whole. The
    /// scan never returns a taken timestamp, so two calls that both persist
    /// their result can never collide.
    pub fn next_slot(&self, now: DateTime<Utc>, taken: &[DateTime<Utc>]) -> DateTime<Utc> {
        let local_now = now.with_timezone(&self.offset);

        for day_offset in 0..=MAX_LOOKAHEAD_DAYS {
            let date = local_now.date_naive() + Days::new(day_offset);
            let taken_today = taken
                .iter()
                .filter(|t| t.with_timezone(&self.offset).date_naive() == date)
                .count();
            if taken_today >= self.daily_cap {
                continue;
            }

            for (hour, minute) in Self::slots_for(date) {
                let candidate = match self
                    .offset
                    .with_ymd_and_hms(date.year(), date.month(), date.day(), *hour, *minute, 0)
                {
                    LocalResult::Single(dt) => dt.with_timezone(&Utc),
                    _ => continue,
                };
                if candidate <= now || taken.contains(&candidate) {
                    continue;
                }
                return candidate;
            }
        }

        // Saturated horizon; park it on the first slot past the scan window
        let date = local_now.date_naive() + Days::new(MAX_LOOKAHEAD_DAYS + 1);
        let (hour, minute) = Self::slots_for(date)[0];
        match self
            .offset
            .with_ymd_and_hms(date.year(), date.month(), date.day(), hour, minute, 0)
        {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            _ => now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn calendar() -> SlotCalendar {
        SlotCalendar::new(9, 4)
    }

    /// Local wall-clock time in the UTC+9 calendar, expressed as UTC.
    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        FixedOffset::east_opt(9 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_first_weekday_slot_when_day_is_empty() {
        // 2026-08-19 is a Wednesday
        let now = local(2026, 8, 19, 6, 0);
        let slot = calendar().next_slot(now, &[]);
        assert_eq!(slot, local(2026, 8, 19, 7, 30));
    }

    #[test]
    fn test_past_slots_are_skipped() {
        let now = local(2026, 8, 19, 13, 0);
        let slot = calendar().next_slot(now, &[]);
        assert_eq!(slot, local(2026, 8, 19, 18, 30));
    }

    #[test]
    fn test_taken_slot_is_skipped() {
        let now = local(2026, 8, 19, 6, 0);
        let taken = vec![local(2026, 8, 19, 7, 30)];
        let slot = calendar().next_slot(now, &taken);
        assert_eq!(slot, local(2026, 8, 19, 12, 0));
    }

    #[test]
    fn test_cap_filled_rolls_to_tomorrow_first_slot() {
        let now = local(2026, 8, 19, 6, 0);
        let taken = vec![
            local(2026, 8, 19, 7, 30),
            local(2026, 8, 19, 12, 0),
            local(2026, 8, 19, 18, 30),
            local(2026, 8, 19, 21, 0),
        ];
        let slot = calendar().next_slot(now, &taken);
        // Thursday first slot
        assert_eq!(slot, local(2026, 8, 20, 7, 30));
    }

    #[test]
    fn test_day_exhausted_rolls_to_tomorrow() {
        // Past the last weekday slot, nothing taken
        let now = local(2026, 8, 19, 22, 0);
        let slot = calendar().next_slot(now, &[]);
        assert_eq!(slot, local(2026, 8, 20, 7, 30));
    }

    #[test]
    fn test_weekend_uses_weekend_slots() {
        // 2026-08-22 is a Saturday
        let now = local(2026, 8, 22, 6, 0);
        let slot = calendar().next_slot(now, &[]);
        assert_eq!(slot, local(2026, 8, 22, 10, 0));
        assert_eq!(
            NaiveDate::from_ymd_opt(2026, 8, 22)
                .unwrap()
                .weekday()
                .num_days_from_monday(),
            5
        );
    }

    #[test]
    fn test_sequential_scheduling_never_repeats_a_timestamp() {
        let cal = calendar();
        let now = local(2026, 8, 19, 6, 0);
        let mut taken: Vec<DateTime<Utc>> = Vec::new();
        for _ in 0..10 {
            let slot = cal.next_slot(now, &taken);
            assert!(!taken.contains(&slot));
            assert!(slot > now);
            taken.push(slot);
        }
        // 4 on Wednesday, 4 on Thursday, 2 on Friday
        assert_eq!(taken[4], local(2026, 8, 20, 7, 30));
        assert_eq!(taken[8], local(2026, 8, 21, 7, 30));
    }
}
