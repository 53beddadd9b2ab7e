//! SQLite-backed production queue.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::debug;

use super::{
    EnsureOutcome, NewProduction, ProductionRecord, ProductionStatus, QueueError, QueueStore,
    Track,
};

/// SQLite-backed queue store.
pub struct SqliteQueueStore {
    conn: Mutex<Connection>,
}

impl SqliteQueueStore {
    /// Open the store, creating the table if needed.
    pub fn new(path: &Path) -> Result<Self, QueueError> {
        let conn = Connection::open(path).map_err(|e| QueueError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, QueueError> {
        let conn =
            Connection::open_in_memory().map_err(|e| QueueError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), QueueError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS productions (
                record_id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER NOT NULL,
                track TEXT NOT NULL,
                quality_score REAL NOT NULL DEFAULT 0,
                priority INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                verdict_pass INTEGER NOT NULL DEFAULT 1,
                video_path TEXT,
                thumbnail_path TEXT,
                failure_reason TEXT,
                created_at TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_productions_source ON productions(source_id);
            CREATE INDEX IF NOT EXISTS idx_productions_status ON productions(status);
            "#,
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ProductionRecord> {
        let track_str: String = row.get(2)?;
        let status_str: String = row.get(5)?;
        let created_at_str: String = row.get(10)?;
        let completed_at_str: Option<String> = row.get(11)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let completed_at = completed_at_str
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(ProductionRecord {
            record_id: row.get(0)?,
            source_id: row.get(1)?,
            track: Track::parse(&track_str).unwrap_or(Track::Info),
            quality_score: row.get(3)?,
            priority: row.get(4)?,
            status: ProductionStatus::parse(&status_str).unwrap_or(ProductionStatus::Failed),
            verdict_pass: row.get::<_, i64>(6)? != 0,
            video_path: row.get(7)?,
            thumbnail_path: row.get(8)?,
            failure_reason: row.get(9)?,
            created_at,
            completed_at,
        })
    }

    fn insert(conn: &Connection, new: &NewProduction) -> Result<(), QueueError> {
        conn.execute(
            "INSERT INTO productions
                (source_id, track, quality_score, priority, status, verdict_pass, created_at)
             VALUES (?, ?, ?, ?, 'PENDING', ?, ?)",
            params![
                new.source_id,
                new.track.as_str(),
                new.quality_score,
                new.priority,
                new.verdict_pass as i64,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;
        Ok(())
    }

    fn latest_locked(
        conn: &Connection,
        source_id: i64,
    ) -> Result<Option<ProductionRecord>, QueueError> {
        conn.query_row(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM productions
                 WHERE source_id = ?
                 ORDER BY priority DESC, record_id DESC
                 LIMIT 1"
            ),
            params![source_id],
            Self::row_to_record,
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            _ => Err(QueueError::Database(e.to_string())),
        })
    }
}

const RECORD_COLUMNS: &str = "record_id, source_id, track, quality_score, priority, status, \
     verdict_pass, video_path, thumbnail_path, failure_reason, created_at, completed_at";

impl QueueStore for SqliteQueueStore {
    fn ensure_ready(&self, defaults: &NewProduction) -> Result<EnsureOutcome, QueueError> {
        let conn = self.conn.lock().unwrap();

        match Self::latest_locked(&conn, defaults.source_id)? {
            None => {
                Self::insert(&conn, defaults)?;
                debug!(source_id = defaults.source_id, "inserted fresh production record");
                Ok(EnsureOutcome::Inserted)
            }
            Some(record) => match record.status {
                ProductionStatus::Pending => Ok(EnsureOutcome::AlreadyPending),
                ProductionStatus::Done => Ok(EnsureOutcome::AlreadyDone),
                ProductionStatus::Failed => {
                    // Verdict gate deliberately left untouched
                    conn.execute(
                        "UPDATE productions
                         SET status = 'PENDING', failure_reason = NULL, completed_at = NULL
                         WHERE record_id = ?",
                        params![record.record_id],
                    )
                    .map_err(|e| QueueError::Database(e.to_string()))?;
                    debug!(
                        source_id = defaults.source_id,
                        record_id = record.record_id,
                        "repaired failed production record"
                    );
                    Ok(EnsureOutcome::Repaired)
                }
            },
        }
    }

    fn enqueue(&self, new: &NewProduction) -> Result<bool, QueueError> {
        let conn = self.conn.lock().unwrap();

        let live = match Self::latest_locked(&conn, new.source_id)? {
            Some(record) => record.status != ProductionStatus::Failed,
            None => false,
        };
        if live {
            return Ok(false);
        }

        Self::insert(&conn, new)?;
        Ok(true)
    }

    fn dequeue_next(&self) -> Result<Option<ProductionRecord>, QueueError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!(
                "SELECT {RECORD_COLUMNS} FROM productions
                 WHERE status = 'PENDING' AND verdict_pass = 1
                 ORDER BY priority DESC, quality_score DESC, record_id ASC
                 LIMIT 1"
            ),
            [],
            Self::row_to_record,
        )
        .map(Some)
        .or_else(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Ok(None),
            _ => Err(QueueError::Database(e.to_string())),
        })
    }

    fn latest(&self, source_id: i64) -> Result<Option<ProductionRecord>, QueueError> {
        let conn = self.conn.lock().unwrap();
        Self::latest_locked(&conn, source_id)
    }

    fn get(&self, record_id: i64) -> Result<ProductionRecord, QueueError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM productions WHERE record_id = ?"),
            params![record_id],
            Self::row_to_record,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => QueueError::NotFound(record_id),
            _ => QueueError::Database(e.to_string()),
        })
    }

    fn mark_done(
        &self,
        record_id: i64,
        video_path: &str,
        thumbnail_path: &str,
    ) -> Result<(), QueueError> {
        let conn = self.conn.lock().unwrap();
        let rows = conn
            .execute(
                "UPDATE productions
                 SET status = 'DONE', video_path = ?, thumbnail_path = ?,
                     failure_reason = NULL, completed_at = ?
                 WHERE record_id = ?",
                params![video_path, thumbnail_path, Utc::now().to_rfc3339(), record_id],
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;

        if rows == 0 {
            return Err(QueueError::NotFound(record_id));
        }
        Ok(())
    }

    fn mark_failed(&self, record_id: i64, reason: &str) -> Result<(), QueueError> {
        let conn = self.conn.lock().unwrap();
        let rows = conn
            .execute(
                "UPDATE productions
                 SET status = 'FAILED', failure_reason = ?, completed_at = ?
                 WHERE record_id = ?",
                params![reason, Utc::now().to_rfc3339(), record_id],
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;

        if rows == 0 {
            return Err(QueueError::NotFound(record_id));
        }
        Ok(())
    }

    fn active_source_ids(&self) -> Result<Vec<i64>, QueueError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT DISTINCT source_id FROM productions WHERE status IN ('PENDING', 'DONE')",
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(|e| QueueError::Database(e.to_string()))?);
        }
        Ok(ids)
    }

    fn done_source_ids(&self) -> Result<Vec<i64>, QueueError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT DISTINCT source_id FROM productions WHERE status = 'DONE'")
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, i64>(0))
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(|e| QueueError::Database(e.to_string()))?);
        }
        Ok(ids)
    }

    fn count_by_status(&self, status: ProductionStatus) -> Result<u64, QueueError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM productions WHERE status = ?",
            params![status.as_str()],
            |row| row.get(0),
        )
        .map_err(|e| QueueError::Database(e.to_string()))
    }

    fn list(&self, limit: usize) -> Result<Vec<ProductionRecord>, QueueError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM productions ORDER BY record_id DESC LIMIT ?"
            ))
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit as i64], Self::row_to_record)
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| QueueError::Database(e.to_string()))?);
        }
        Ok(records)
    }
}
