//! Durable schedule entries.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{ScheduleEntry, ScheduleError, UploadStatus};

/// Persistence for schedule entries.
pub trait ScheduleStore: Send + Sync {
    /// Insert a SCHEDULED entry. Rejects a second entry for the same source
    /// and any entry reusing an existing timestamp.
    fn insert(
        &self,
        source_id: i64,
        scheduled_time: DateTime<Utc>,
    ) -> Result<ScheduleEntry, ScheduleError>;

    /// The entry for a source, if any.
    fn get_by_source(&self, source_id: i64) -> Result<Option<ScheduleEntry>, ScheduleError>;

    /// Timestamps of all entries still waiting to upload.
    fn scheduled_times(&self) -> Result<Vec<DateTime<Utc>>, ScheduleError>;

    /// SCHEDULED entries whose time has come, oldest first.
    fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduleEntry>, ScheduleError>;

    /// Record a completed upload with the platform-assigned content id.
    fn mark_uploaded(&self, id: i64, remote_id: &str) -> Result<(), ScheduleError>;

    /// Newest entries first.
    fn list(&self, limit: usize) -> Result<Vec<ScheduleEntry>, ScheduleError>;
}

/// SQLite-backed schedule store.
pub struct SqliteScheduleStore {
    conn: Mutex<Connection>,
}

impl SqliteScheduleStore {
    /// Open the store, creating the table if needed.
    pub fn new(path: &Path) -> Result<Self, ScheduleError> {
        let conn = Connection::open(path).map_err(|e| ScheduleError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, ScheduleError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ScheduleError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ScheduleError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schedule_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER NOT NULL UNIQUE,
                scheduled_time TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL,
                uploaded_at TEXT,
                remote_id TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_schedule_status ON schedule_entries(status);
            "#,
        )
        .map_err(|e| ScheduleError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<ScheduleEntry> {
        let scheduled_time_str: String = row.get(2)?;
        let status_str: String = row.get(3)?;
        let uploaded_at_str: Option<String> = row.get(4)?;

        let scheduled_time = DateTime::parse_from_rfc3339(&scheduled_time_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let uploaded_at = uploaded_at_str
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(ScheduleEntry {
            id: row.get(0)?,
            source_id: row.get(1)?,
            scheduled_time,
            status: UploadStatus::parse(&status_str).unwrap_or(UploadStatus::Scheduled),
            uploaded_at,
            remote_id: row.get(5)?,
        })
    }
}

const ENTRY_COLUMNS: &str =
    "id, source_id, scheduled_time, status, uploaded_at, remote_id";

impl ScheduleStore for SqliteScheduleStore {
    fn insert(
        &self,
        source_id: i64,
        scheduled_time: DateTime<Utc>,
    ) -> Result<ScheduleEntry, ScheduleError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO schedule_entries (source_id, scheduled_time, status)
             VALUES (?, ?, 'SCHEDULED')",
            params![source_id, scheduled_time.to_rfc3339()],
        )
        .map_err(|e| match &e {
            rusqlite::Error::SqliteFailure(err, Some(msg))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                if msg.contains("source_id") {
                    ScheduleError::AlreadyScheduled(source_id)
                } else {
                    ScheduleError::SlotTaken(scheduled_time.to_rfc3339())
                }
            }
            _ => ScheduleError::Database(e.to_string()),
        })?;

        let id = conn.last_insert_rowid();
        Ok(ScheduleEntry {
            id,
            source_id,
            scheduled_time,
            status: UploadStatus::Scheduled,
            uploaded_at: None,
            remote_id: None,
        })
    }

    fn get_by_source(&self, source_id: i64) -> Result<Option<ScheduleEntry>, ScheduleError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {ENTRY_COLUMNS} FROM schedule_entries WHERE source_id = ?"),
            params![source_id],
            Self::row_to_entry,
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            _ => Err(ScheduleError::Database(e.to_string())),
        })
    }

    fn scheduled_times(&self) -> Result<Vec<DateTime<Utc>>, ScheduleError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT scheduled_time FROM schedule_entries WHERE status = 'SCHEDULED'")
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        let mut times = Vec::new();
        for row in rows {
            let s = row.map_err(|e| ScheduleError::Database(e.to_string()))?;
            if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                times.push(dt.with_timezone(&Utc));
            }
        }
        Ok(times)
    }

    fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM schedule_entries
                 WHERE status = 'SCHEDULED' AND scheduled_time <= ?
                 ORDER BY scheduled_time ASC"
            ))
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![now.to_rfc3339()], Self::row_to_entry)
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| ScheduleError::Database(e.to_string()))?);
        }
        Ok(entries)
    }

    fn mark_uploaded(&self, id: i64, remote_id: &str) -> Result<(), ScheduleError> {
        let conn = self.conn.lock().unwrap();
        let rows = conn
            .execute(
                "UPDATE schedule_entries
                 SET status = 'UPLOADED', uploaded_at = ?, remote_id = ?
                 WHERE id = ?",
                params![Utc::now().to_rfc3339(), remote_id, id],
            )
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        if rows == 0 {
            return Err(ScheduleError::NotFound(id));
        }
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<ScheduleEntry>, ScheduleError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM schedule_entries ORDER BY id DESC LIMIT ?"
            ))
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit as i64], Self::row_to_entry)
            .map_err(|e| ScheduleError::Database(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| ScheduleError::Database(e.to_string()))?);
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_store() -> SqliteScheduleStore {
        SqliteScheduleStore::in_memory().unwrap()
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 19, h, 0, 0).unwrap()
    }

    #[test]
    fn test_insert_and_get_by_source() {
        let store = make_store();
        let entry = store.insert(42, at(9)).unwrap();
        assert_eq!(entry.source_id, 42);
        assert_eq!(entry.status, UploadStatus::Scheduled);

        let fetched = store.get_by_source(42).unwrap().unwrap();
        assert_eq!(fetched.id, entry.id);
        assert_eq!(fetched.scheduled_time, at(9));
        assert!(store.get_by_source(7).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let store = make_store();
        store.insert(42, at(9)).unwrap();
        let result = store.insert(42, at(12));
        assert!(matches!(result, Err(ScheduleError::AlreadyScheduled(42))));
    }

    #[test]
    fn test_duplicate_timestamp_rejected() {
        let store = make_store();
        store.insert(1, at(9)).unwrap();
        let result = store.insert(2, at(9));
        assert!(matches!(result, Err(ScheduleError::SlotTaken(_))));
    }

    #[test]
    fn test_scheduled_times_exclude_uploaded() {
        let store = make_store();
        let a = store.insert(1, at(9)).unwrap();
        store.insert(2, at(12)).unwrap();
        store.mark_uploaded(a.id, "yt-abc").unwrap();

        assert_eq!(store.scheduled_times().unwrap(), vec![at(12)]);
    }

    #[test]
    fn test_due_filters_and_orders() {
        let store = make_store();
        store.insert(1, at(12)).unwrap();
        store.insert(2, at(9)).unwrap();
        store.insert(3, at(18)).unwrap();

        let due = store.due(at(13)).unwrap();
        let sources: Vec<i64> = due.iter().map(|e| e.source_id).collect();
        assert_eq!(sources, vec![2, 1]);
    }

    #[test]
    fn test_mark_uploaded_sets_remote_id() {
        let store = make_store();
        let entry = store.insert(1, at(9)).unwrap();
        store.mark_uploaded(entry.id, "yt-xyz").unwrap();

        let updated = store.get_by_source(1).unwrap().unwrap();
        assert_eq!(updated.status, UploadStatus::Uploaded);
        assert_eq!(updated.remote_id.as_deref(), Some("yt-xyz"));
        assert!(updated.uploaded_at.is_some());

        assert!(store.due(at(23)).unwrap().is_empty());
    }

    #[test]
    fn test_mark_uploaded_missing_entry() {
        let store = make_store();
        assert!(matches!(
            store.mark_uploaded(99, "x"),
            Err(ScheduleError::NotFound(99))
        ));
    }

    #[test]
    fn test_list_newest_first() {
        let store = make_store();
        store.insert(1, at(9)).unwrap();
        store.insert(2, at(12)).unwrap();

        let listed = store.list(1).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].source_id, 2);
    }
}
