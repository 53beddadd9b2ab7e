use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Production track a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Track {
    /// High-popularity reaction format
    #[serde(rename = "AGRO")]
    Agro,
    /// Explainer format for deeper articles
    #[serde(rename = "INFO")]
    Info,
}

impl Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Agro => "AGRO",
            Track::Info => "INFO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AGRO" => Some(Track::Agro),
            "INFO" => Some(Track::Info),
            _ => None,
        }
    }
}

/// Lifecycle state of a production record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductionStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "DONE")]
    Done,
    #[serde(rename = "FAILED")]
    Failed,
}

impl ProductionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionStatus::Pending => "PENDING",
            ProductionStatus::Done => "DONE",
            ProductionStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ProductionStatus::Pending),
            "DONE" => Some(ProductionStatus::Done),
            "FAILED" => Some(ProductionStatus::Failed),
            _ => None,
        }
    }
}

/// One production attempt for a source article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub record_id: i64,
    pub source_id: i64,
    pub track: Track,
    pub quality_score: f64,
    pub priority: i64,
    pub status: ProductionStatus,
    /// Editorial gate; dequeue only hands out records that passed it
    pub verdict_pass: bool,
    pub video_path: Option<String>,
    pub thumbnail_path: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields used when inserting a fresh record.
#[derive(Debug, Clone)]
pub struct NewProduction {
    pub source_id: i64,
    pub track: Track,
    pub quality_score: f64,
    pub priority: i64,
    pub verdict_pass: bool,
}

impl NewProduction {
    pub fn new(source_id: i64, track: Track) -> Self {
        Self {
            source_id,
            track,
            quality_score: 0.0,
            priority: 0,
            verdict_pass: true,
        }
    }

    pub fn with_quality(mut self, score: f64) -> Self {
        self.quality_score = score;
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }
}

/// Outcome of [`crate::queue::QueueStore::ensure_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsureOutcome {
    /// A PENDING record already existed, nothing changed
    AlreadyPending,
    /// A DONE record already existed, nothing changed
    AlreadyDone,
    /// A FAILED record was flipped back to PENDING
    Repaired,
    /// No record existed, a fresh PENDING one was inserted
    Inserted,
}

/// Pick the authoritative record among several for the same source:
/// highest priority wins, then the newest record id.
pub fn most_recent(records: &[ProductionRecord]) -> Option<&ProductionRecord> {
    records
        .iter()
        .max_by_key(|r| (r.priority, r.record_id))
}
