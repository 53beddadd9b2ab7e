use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    #[serde(rename = "SCHEDULED")]
    Scheduled,
    #[serde(rename = "UPLOADED")]
    Uploaded,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Scheduled => "SCHEDULED",
            UploadStatus::Uploaded => "UPLOADED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(UploadStatus::Scheduled),
            "UPLOADED" => Some(UploadStatus::Uploaded),
            _ => None,
        }
    }
}

/// One planned (or completed) publication.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEntry {
    pub id: i64,
    pub source_id: i64,
    pub scheduled_time: DateTime<Utc>,
    pub status: UploadStatus,
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Content id assigned by the delivery platform once uploaded.
    pub remote_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [UploadStatus::Scheduled, UploadStatus::Uploaded] {
            assert_eq!(UploadStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(UploadStatus::parse("PENDING"), None);
    }
}
