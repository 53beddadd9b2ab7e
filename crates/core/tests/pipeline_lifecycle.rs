//! Full lifecycle integration tests.
//!
//! Exercise the whole path with mock external services and real SQLite
//! stores: curation admits an article, production turns it into a video,
//! the scheduler books a slot, and the delivery worker uploads it.

use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use clipforge_core::{
    compose::Renderer,
    config::{CurationConfig, SchedulerConfig, SynthesisConfig},
    curation::{CurationEngine, CurationQuotas},
    narration::NarrationStage,
    pipeline::{InFlightRegistry, Synthesizer},
    queue::{NewProduction, ProductionStatus, QueueStore, SqliteQueueStore, Track},
    repository::{SourceItem, SqliteArticleRepository},
    schedule::{
        DeliveryWorker, Scheduler, ScheduleStore, SlotCalendar, SqliteScheduleStore, UploadStatus,
    },
    script::ScriptGenerator,
    testing::{
        MockDeliveryApi, MockEmbedder, MockImageProvider, MockRenderer, MockScriptModel,
        MockSpeechService,
    },
};

struct TestHarness {
    repository: Arc<SqliteArticleRepository>,
    queue: Arc<SqliteQueueStore>,
    schedule: Arc<SqliteScheduleStore>,
    delivery_api: Arc<MockDeliveryApi>,
    curation: CurationEngine,
    synthesizer: Synthesizer,
    delivery: DeliveryWorker,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repository = Arc::new(SqliteArticleRepository::in_memory().unwrap());
        let queue = Arc::new(SqliteQueueStore::in_memory().unwrap());
        let schedule = Arc::new(SqliteScheduleStore::in_memory().unwrap());
        let registry = Arc::new(InFlightRegistry::new());
        let delivery_api = Arc::new(MockDeliveryApi::new());

        let mut synthesis_config = SynthesisConfig::default();
        synthesis_config.temp_dir = temp_dir.path().join("work");
        synthesis_config.output_dir = temp_dir.path().join("videos");
        synthesis_config.retry_base_delay_secs = 0.0;

        let scheduler_config = SchedulerConfig::default();
        let scheduler = Arc::new(Scheduler::new(
            schedule.clone(),
            SlotCalendar::new(
                scheduler_config.utc_offset_hours,
                scheduler_config.daily_cap,
            ),
        ));

        let curation = CurationEngine::new(
            repository.clone(),
            queue.clone(),
            Arc::new(MockEmbedder::new()),
            CurationConfig::default(),
        );

        let synthesizer = Synthesizer::new(
            repository.clone(),
            queue.clone(),
            registry,
            ScriptGenerator::new(Arc::new(MockScriptModel::new())),
            NarrationStage::new(
                Arc::new(MockSpeechService::new("primary")),
                Some(Arc::new(MockSpeechService::new("secondary"))),
                synthesis_config.clone(),
            ),
            Arc::new(MockImageProvider::new()),
            Arc::new(MockRenderer::new()) as Arc<dyn Renderer>,
            scheduler,
            synthesis_config,
        );

        let delivery = DeliveryWorker::new(
            schedule.clone(),
            queue.clone(),
            repository.clone(),
            delivery_api.clone(),
        );

        Self {
            repository,
            queue,
            schedule,
            delivery_api,
            curation,
            synthesizer,
            delivery,
            _temp_dir: temp_dir,
        }
    }

    fn seed_article(&self, id: i64, title: &str, popularity: i64) {
        self.repository
            .upsert_article(&SourceItem {
                id,
                title: title.to_string(),
                body: "A long enough article body. ".repeat(30),
                popularity,
                reply_count: 12,
                persona: None,
                created_at: Utc::now(),
            })
            .unwrap();
    }
}

#[tokio::test]
async fn test_curate_then_produce_then_schedule() {
    let h = TestHarness::new();
    h.seed_article(42, "X", 120);

    // Curation admits the article on the reaction track
    let report = h
        .curation
        .curate(CurationQuotas { agro: 1, info: 0 }, 0.0)
        .await;
    assert_eq!(report.selected.len(), 1);
    assert_eq!(report.selected[0].source_id, 42);
    assert_eq!(report.selected[0].track, Track::Agro);

    let record = h.queue.latest(42).unwrap().unwrap();
    assert_eq!(record.status, ProductionStatus::Pending);

    // Production runs the full pipeline
    let done = h.synthesizer.produce(42).await.unwrap();
    assert_eq!(done.status, ProductionStatus::Done);
    assert!(done.video_path.is_some());
    assert!(done.thumbnail_path.is_some());

    // A schedule entry exists at a future slot
    let entry = h.schedule.get_by_source(42).unwrap().unwrap();
    assert_eq!(entry.status, UploadStatus::Scheduled);
    assert!(entry.scheduled_time > Utc::now());
}

#[tokio::test]
async fn test_full_lifecycle_through_delivery() {
    let h = TestHarness::new();
    h.seed_article(7, "Lifecycle", 150);

    h.curation
        .curate(CurationQuotas { agro: 1, info: 0 }, 0.0)
        .await;
    h.synthesizer.produce(7).await.unwrap();

    let entry = h.schedule.get_by_source(7).unwrap().unwrap();

    // Nothing due before the slot
    assert_eq!(
        h.delivery
            .deliver_due(entry.scheduled_time - chrono::Duration::minutes(1))
            .await,
        0
    );

    // Once the slot passes, the video goes out
    assert_eq!(
        h.delivery
            .deliver_due(entry.scheduled_time + chrono::Duration::minutes(1))
            .await,
        1
    );

    let uploaded = h.schedule.get_by_source(7).unwrap().unwrap();
    assert_eq!(uploaded.status, UploadStatus::Uploaded);
    assert!(uploaded.remote_id.is_some());

    let requests = h.delivery_api.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].title, "Lifecycle");
}

#[tokio::test]
async fn test_curation_skips_article_already_in_production() {
    let h = TestHarness::new();
    h.seed_article(1, "Already queued", 200);
    h.queue.enqueue(&NewProduction::new(1, Track::Agro)).unwrap();

    let report = h
        .curation
        .curate(CurationQuotas { agro: 1, info: 0 }, 0.0)
        .await;
    assert!(report.selected.is_empty());
}

#[tokio::test]
async fn test_failed_production_can_be_repaired_and_rerun() {
    let h = TestHarness::new();
    h.seed_article(3, "Bounce back", 130);
    h.queue.enqueue(&NewProduction::new(3, Track::Agro)).unwrap();
    let record = h.queue.latest(3).unwrap().unwrap();
    h.queue.mark_failed(record.record_id, "first attempt died").unwrap();

    // Repair happens inside produce via ensure-ready semantics
    let done = h.synthesizer.produce(3).await.unwrap();
    assert_eq!(done.status, ProductionStatus::Done);
    assert_eq!(done.record_id, record.record_id);
}
