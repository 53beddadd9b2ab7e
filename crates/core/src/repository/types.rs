use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One article from the external discussion board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceItem {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub popularity: i64,
    pub reply_count: i64,
    /// Editorial persona attached by the ingest side, if any
    pub persona: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Ordering applied to a candidate query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrder {
    PopularityDesc,
    BodyLengthDesc,
}

/// Filters for fetching curation candidates.
#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub min_body_chars: usize,
    pub min_popularity: i64,
    pub order: CandidateOrder,
    pub limit: usize,
    /// Source ids to leave out (typically those with a live production record)
    pub exclude_ids: Vec<i64>,
}

impl CandidateQuery {
    pub fn new(min_body_chars: usize, min_popularity: i64, order: CandidateOrder) -> Self {
        Self {
            min_body_chars,
            min_popularity,
            order,
            limit: 30,
            exclude_ids: Vec::new(),
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_excluded(mut self, ids: Vec<i64>) -> Self {
        self.exclude_ids = ids;
        self
    }
}
