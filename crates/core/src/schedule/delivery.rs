//! Delivery worker: uploads due videos to the publication platform.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DeliveryConfig;
use crate::metrics;
use crate::queue::{ProductionStatus, QueueStore};
use crate::repository::CandidateRepository;

use super::ScheduleStore;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Upload failed: {0}")]
    Upload(String),
}

/// Upload payload for one video.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub title: String,
    pub video_path: String,
    pub thumbnail_path: Option<String>,
}

/// Publication platform API.
#[async_trait]
pub trait DeliveryApi: Send + Sync {
    /// Upload one video; returns the platform-assigned content id.
    async fn upload(&self, request: &UploadRequest) -> Result<String, DeliveryError>;
}

/// Delivery API over an HTTP multipart upload endpoint.
pub struct RemoteDeliveryClient {
    config: DeliveryConfig,
    client: reqwest::Client,
}

#[derive(serde::Deserialize)]
struct UploadResponse {
    id: String,
}

impl RemoteDeliveryClient {
    pub fn new(config: DeliveryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }
}

#[async_trait]
impl DeliveryApi for RemoteDeliveryClient {
    async fn upload(&self, request: &UploadRequest) -> Result<String, DeliveryError> {
        let url = format!("{}/upload", self.config.url.trim_end_matches('/'));

        let video = tokio::fs::read(&request.video_path)
            .await
            .map_err(|e| DeliveryError::Upload(format!("reading video file: {e}")))?;
        let mut form = reqwest::multipart::Form::new()
            .text("title", request.title.clone())
            .part(
                "video",
                reqwest::multipart::Part::bytes(video).file_name("video.mp4"),
            );
        if let Some(thumbnail_path) = &request.thumbnail_path {
            if let Ok(thumbnail) = tokio::fs::read(thumbnail_path).await {
                form = form.part(
                    "thumbnail",
                    reqwest::multipart::Part::bytes(thumbnail).file_name("thumbnail.jpg"),
                );
            }
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DeliveryError::Upload(format!(
                "delivery endpoint returned {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::Upload(e.to_string()))?;
        Ok(body.id)
    }
}

/// Polls the schedule and pushes out every entry whose time has come.
pub struct DeliveryWorker {
    schedule: Arc<dyn ScheduleStore>,
    queue: Arc<dyn QueueStore>,
    repository: Arc<dyn CandidateRepository>,
    api: Arc<dyn DeliveryApi>,
}

impl DeliveryWorker {
    pub fn new(
        schedule: Arc<dyn ScheduleStore>,
        queue: Arc<dyn QueueStore>,
        repository: Arc<dyn CandidateRepository>,
        api: Arc<dyn DeliveryApi>,
    ) -> Self {
        Self {
            schedule,
            queue,
            repository,
            api,
        }
    }

    /// Upload every due entry backed by a finished video. Failures are
    /// logged and retried on the next poll; the entry stays SCHEDULED.
    pub async fn deliver_due(&self, now: DateTime<Utc>) -> usize {
        let due = match self.schedule.due(now) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read due schedule entries: {}", e);
                return 0;
            }
        };

        let mut uploaded = 0;
        for entry in due {
            let record = match self.queue.latest(entry.source_id) {
                Ok(Some(record)) if record.status == ProductionStatus::Done => record,
                Ok(_) => {
                    debug!(
                        source_id = entry.source_id,
                        "Skipping due entry without a finished video"
                    );
                    continue;
                }
                Err(e) => {
                    warn!(source_id = entry.source_id, "Queue lookup failed: {}", e);
                    continue;
                }
            };
            let Some(video_path) = record.video_path else {
                warn!(
                    source_id = entry.source_id,
                    "Finished record has no video path"
                );
                continue;
            };

            let title = self
                .repository
                .get(entry.source_id)
                .map(|item| item.title)
                .unwrap_or_else(|_| format!("Clip #{}", entry.source_id));

            let request = UploadRequest {
                title,
                video_path,
                thumbnail_path: record.thumbnail_path,
            };
            match self.api.upload(&request).await {
                Ok(remote_id) => {
                    if let Err(e) = self.schedule.mark_uploaded(entry.id, &remote_id) {
                        warn!(entry_id = entry.id, "Failed to record upload: {}", e);
                        continue;
                    }
                    metrics::UPLOADS_TOTAL.with_label_values(&["success"]).inc();
                    info!(
                        source_id = entry.source_id,
                        remote_id, "Uploaded scheduled video"
                    );
                    uploaded += 1;
                }
                Err(e) => {
                    metrics::UPLOADS_TOTAL.with_label_values(&["failure"]).inc();
                    warn!(
                        source_id = entry.source_id,
                        "Upload failed, will retry next poll: {}", e
                    );
                }
            }
        }
        uploaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{NewProduction, Track};
    use crate::queue::SqliteQueueStore;
    use crate::repository::SqliteArticleRepository;
    use crate::schedule::SqliteScheduleStore;
    use crate::testing::MockDeliveryApi;
    use chrono::TimeZone;

    struct Harness {
        schedule: Arc<SqliteScheduleStore>,
        queue: Arc<SqliteQueueStore>,
        repository: Arc<SqliteArticleRepository>,
        api: Arc<MockDeliveryApi>,
        worker: DeliveryWorker,
    }

    fn make_harness() -> Harness {
        let schedule = Arc::new(SqliteScheduleStore::in_memory().unwrap());
        let queue = Arc::new(SqliteQueueStore::in_memory().unwrap());
        let repository = Arc::new(SqliteArticleRepository::in_memory().unwrap());
        let api = Arc::new(MockDeliveryApi::new());
        let worker = DeliveryWorker::new(
            schedule.clone(),
            queue.clone(),
            repository.clone(),
            api.clone(),
        );
        Harness {
            schedule,
            queue,
            repository,
            api,
            worker,
        }
    }

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 19, h, 0, 0).unwrap()
    }

    fn seed_done(h: &Harness, source_id: i64) {
        h.repository
            .upsert_article(&crate::repository::SourceItem {
                id: source_id,
                title: format!("Article {source_id}"),
                body: "body".to_string(),
                popularity: 100,
                reply_count: 0,
                persona: None,
                created_at: Utc::now(),
            })
            .unwrap();
        h.queue.enqueue(&NewProduction::new(source_id, Track::Agro)).unwrap();
        let record = h.queue.latest(source_id).unwrap().unwrap();
        h.queue
            .mark_done(record.record_id, "/out/v.mp4", "/out/t.jpg")
            .unwrap();
    }

    #[tokio::test]
    async fn test_uploads_due_entries() {
        let h = make_harness();
        seed_done(&h, 1);
        h.schedule.insert(1, at(9)).unwrap();

        let uploaded = h.worker.deliver_due(at(10)).await;
        assert_eq!(uploaded, 1);

        let entry = h.schedule.get_by_source(1).unwrap().unwrap();
        assert_eq!(entry.status, crate::schedule::UploadStatus::Uploaded);
        assert!(entry.remote_id.is_some());

        let requests = h.api.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].title, "Article 1");
        assert_eq!(requests[0].video_path, "/out/v.mp4");
    }

    #[tokio::test]
    async fn test_skips_entries_not_yet_due() {
        let h = make_harness();
        seed_done(&h, 1);
        h.schedule.insert(1, at(18)).unwrap();

        assert_eq!(h.worker.deliver_due(at(10)).await, 0);
        assert!(h.api.requests().is_empty());
    }

    #[tokio::test]
    async fn test_skips_entry_without_done_record() {
        let h = make_harness();
        h.repository
            .upsert_article(&crate::repository::SourceItem {
                id: 1,
                title: "Pending".to_string(),
                body: "body".to_string(),
                popularity: 100,
                reply_count: 0,
                persona: None,
                created_at: Utc::now(),
            })
            .unwrap();
        h.queue.enqueue(&NewProduction::new(1, Track::Agro)).unwrap();
        h.schedule.insert(1, at(9)).unwrap();

        assert_eq!(h.worker.deliver_due(at(10)).await, 0);
        assert!(h.api.requests().is_empty());

        // Entry stays SCHEDULED for the next poll
        let entry = h.schedule.get_by_source(1).unwrap().unwrap();
        assert_eq!(entry.status, crate::schedule::UploadStatus::Scheduled);
    }

    #[tokio::test]
    async fn test_failed_upload_stays_scheduled() {
        let h = make_harness();
        seed_done(&h, 1);
        h.schedule.insert(1, at(9)).unwrap();
        h.api.fail_next("platform down");

        assert_eq!(h.worker.deliver_due(at(10)).await, 0);
        let entry = h.schedule.get_by_source(1).unwrap().unwrap();
        assert_eq!(entry.status, crate::schedule::UploadStatus::Scheduled);

        // Retried on the next poll
        assert_eq!(h.worker.deliver_due(at(11)).await, 1);
    }

    #[tokio::test]
    async fn test_uploads_oldest_first() {
        let h = make_harness();
        seed_done(&h, 1);
        seed_done(&h, 2);
        h.schedule.insert(1, at(12)).unwrap();
        h.schedule.insert(2, at(9)).unwrap();

        assert_eq!(h.worker.deliver_due(at(13)).await, 2);
        let requests = h.api.requests();
        assert_eq!(requests[0].title, "Article 2");
        assert_eq!(requests[1].title, "Article 1");
    }
}
