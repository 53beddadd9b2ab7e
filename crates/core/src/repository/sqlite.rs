//! SQLite-backed article repository.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ToSql};

use super::{CandidateOrder, CandidateQuery, CandidateRepository, RepositoryError, SourceItem};

/// SQLite-backed view over mirrored articles and replies.
pub struct SqliteArticleRepository {
    conn: Mutex<Connection>,
}

impl SqliteArticleRepository {
    /// Open the repository, creating tables if needed.
    pub fn new(path: &Path) -> Result<Self, RepositoryError> {
        let conn = Connection::open(path).map_err(|e| RepositoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory repository (useful for testing).
    pub fn in_memory() -> Result<Self, RepositoryError> {
        let conn =
            Connection::open_in_memory().map_err(|e| RepositoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RepositoryError> {
        conn.execute_batch(
            r#"
            -- Mirrored articles (one row per board post)
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                popularity INTEGER NOT NULL DEFAULT 0,
                reply_count INTEGER NOT NULL DEFAULT 0,
                persona TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_articles_popularity ON articles(popularity);
            CREATE INDEX IF NOT EXISTS idx_articles_created ON articles(created_at);

            -- Replies attached to articles
            CREATE TABLE IF NOT EXISTS replies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_replies_article ON replies(article_id);
            "#,
        )
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    /// Insert or replace an article. The ingest side owns this data; exposed
    /// here for mirroring and for tests.
    pub fn upsert_article(&self, item: &SourceItem) -> Result<(), RepositoryError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO articles (id, title, body, popularity, reply_count, persona, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                popularity = excluded.popularity,
                reply_count = excluded.reply_count,
                persona = excluded.persona",
            params![
                item.id,
                &item.title,
                &item.body,
                item.popularity,
                item.reply_count,
                &item.persona,
                item.created_at.to_rfc3339(),
            ],
        )
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    /// Append a reply to an article.
    pub fn add_reply(&self, article_id: i64, body: &str) -> Result<(), RepositoryError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO replies (article_id, body, created_at) VALUES (?, ?, ?)",
            params![article_id, body, Utc::now().to_rfc3339()],
        )
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    fn row_to_source_item(row: &rusqlite::Row) -> rusqlite::Result<SourceItem> {
        let created_at_str: String = row.get(6)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(SourceItem {
            id: row.get(0)?,
            title: row.get(1)?,
            body: row.get(2)?,
            popularity: row.get(3)?,
            reply_count: row.get(4)?,
            persona: row.get(5)?,
            created_at,
        })
    }
}

const SOURCE_ITEM_COLUMNS: &str =
    "id, title, body, popularity, reply_count, persona, created_at";

impl CandidateRepository for SqliteArticleRepository {
    fn get(&self, id: i64) -> Result<SourceItem, RepositoryError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            &format!("SELECT {SOURCE_ITEM_COLUMNS} FROM articles WHERE id = ?"),
            params![id],
            Self::row_to_source_item,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound(id),
            _ => RepositoryError::Database(e.to_string()),
        })
    }

    fn exists(&self, id: i64) -> Result<bool, RepositoryError> {
        let conn = self.conn.lock().unwrap();
        let exists: bool = conn
            .query_row("SELECT 1 FROM articles WHERE id = ?", params![id], |_| {
                Ok(true)
            })
            .unwrap_or(false);
        Ok(exists)
    }

    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<SourceItem>, RepositoryError> {
        let conn = self.conn.lock().unwrap();

        let mut sql = format!(
            "SELECT {SOURCE_ITEM_COLUMNS} FROM articles
             WHERE LENGTH(body) >= ? AND popularity > ?"
        );
        let mut sql_params: Vec<Box<dyn ToSql>> = vec![
            Box::new(query.min_body_chars as i64),
            Box::new(query.min_popularity),
        ];

        if !query.exclude_ids.is_empty() {
            let placeholders = vec!["?"; query.exclude_ids.len()].join(", ");
            sql.push_str(&format!(" AND id NOT IN ({placeholders})"));
            for id in &query.exclude_ids {
                sql_params.push(Box::new(*id));
            }
        }

        match query.order {
            CandidateOrder::PopularityDesc => sql.push_str(" ORDER BY popularity DESC, id DESC"),
            CandidateOrder::BodyLengthDesc => sql.push_str(" ORDER BY LENGTH(body) DESC, id DESC"),
        }
        sql.push_str(" LIMIT ?");
        sql_params.push(Box::new(query.limit as i64));

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let param_refs: Vec<&dyn ToSql> = sql_params.iter().map(|p| p.as_ref()).collect();
        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_source_item)
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| RepositoryError::Database(e.to_string()))?);
        }
        Ok(items)
    }

    fn reply_texts(&self, article_id: i64) -> Result<Vec<String>, RepositoryError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT body FROM replies WHERE article_id = ? ORDER BY id ASC")
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![article_id], |row| row.get::<_, String>(0))
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut texts = Vec::new();
        for row in rows {
            texts.push(row.map_err(|e| RepositoryError::Database(e.to_string()))?);
        }
        Ok(texts)
    }

    fn recent(&self, limit: usize) -> Result<Vec<SourceItem>, RepositoryError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {SOURCE_ITEM_COLUMNS} FROM articles ORDER BY created_at DESC, id DESC LIMIT ?"
            ))
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![limit as i64], Self::row_to_source_item)
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(|e| RepositoryError::Database(e.to_string()))?);
        }
        Ok(items)
    }
}
