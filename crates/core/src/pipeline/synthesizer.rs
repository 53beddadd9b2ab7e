//! The synthesizer: one article in, one finished (or failed) video out.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::compose::{build_timeline, ComposeError, ImageProvider, RenderAssets, Renderer};
use crate::config::SynthesisConfig;
use crate::metrics;
use crate::narration::NarrationStage;
use crate::queue::{NewProduction, ProductionRecord, ProductionStatus, QueueStore, Track};
use crate::repository::{CandidateRepository, RepositoryError, SourceItem};
use crate::schedule::{ScheduleError, Scheduler};
use crate::script::{ScriptError, ScriptGenerator};

use super::{InFlightRegistry, SynthesisError};

/// Background images fetched per production.
const BACKGROUND_IMAGE_COUNT: usize = 4;

/// Runs the full production pipeline for one record at a time.
pub struct Synthesizer {
    repository: Arc<dyn CandidateRepository>,
    queue: Arc<dyn QueueStore>,
    registry: Arc<InFlightRegistry>,
    scripts: ScriptGenerator,
    narration: NarrationStage,
    images: Arc<dyn ImageProvider>,
    renderer: Arc<dyn Renderer>,
    scheduler: Arc<Scheduler>,
    config: SynthesisConfig,
}

impl Synthesizer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repository: Arc<dyn CandidateRepository>,
        queue: Arc<dyn QueueStore>,
        registry: Arc<InFlightRegistry>,
        scripts: ScriptGenerator,
        narration: NarrationStage,
        images: Arc<dyn ImageProvider>,
        renderer: Arc<dyn Renderer>,
        scheduler: Arc<Scheduler>,
        config: SynthesisConfig,
    ) -> Self {
        Self {
            repository,
            queue,
            registry,
            scripts,
            narration,
            images,
            renderer,
            scheduler,
            config,
        }
    }

    /// On-demand production for one source. Ensures a workable record exists,
    /// then synthesizes it. A source whose record is already DONE is returned
    /// unchanged.
    pub async fn produce(&self, source_id: i64) -> Result<ProductionRecord, SynthesisError> {
        let permit = self.registry.acquire(source_id)?;

        let item = match self.repository.get(source_id) {
            Ok(item) => item,
            Err(RepositoryError::NotFound(_)) => {
                // A leftover PENDING record for a vanished article is dead
                // weight; fail it while we know.
                if let Some(record) = self.queue.latest(source_id)? {
                    if record.status == ProductionStatus::Pending {
                        let diagnostic = SynthesisError::Integrity(format!(
                            "source item {} no longer exists",
                            source_id
                        ));
                        self.queue
                            .mark_failed(record.record_id, &diagnostic.to_string())?;
                    }
                }
                return Err(SynthesisError::NotFound(source_id));
            }
            Err(e) => return Err(e.into()),
        };

        let record = match self.queue.latest(source_id)? {
            Some(record) if record.status == ProductionStatus::Done => return Ok(record),
            Some(record) if record.status == ProductionStatus::Pending => record,
            _ => {
                self.queue
                    .ensure_ready(&NewProduction::new(source_id, Track::Info))?;
                self.queue
                    .latest(source_id)?
                    .ok_or(SynthesisError::NotFound(source_id))?
            }
        };

        let result = self.synthesize(&item, &record).await;
        drop(permit);
        result
    }

    /// Dequeue and synthesize the next workable record, if any. Orphaned
    /// records are failed in place and the scan continues.
    pub async fn produce_next(&self) -> Result<Option<ProductionRecord>, SynthesisError> {
        loop {
            let Some(record) = self.queue.dequeue_next()? else {
                return Ok(None);
            };

            let item = match self.repository.get(record.source_id) {
                Ok(item) => item,
                Err(RepositoryError::NotFound(_)) => {
                    warn!(
                        source_id = record.source_id,
                        record_id = record.record_id,
                        "Orphaned production record, marking failed"
                    );
                    let diagnostic = SynthesisError::Integrity(format!(
                        "source item {} no longer exists",
                        record.source_id
                    ));
                    self.queue
                        .mark_failed(record.record_id, &diagnostic.to_string())?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let permit = match self.registry.acquire(record.source_id) {
                Ok(permit) => permit,
                // Someone else is already on it; nothing to do this tick
                Err(SynthesisError::Conflict(_)) => return Ok(None),
                Err(e) => return Err(e),
            };
            let result = self.synthesize(&item, &record).await;
            drop(permit);
            return result.map(Some);
        }
    }

    /// Run the stages for one record and finalize its status. Caller holds
    /// the permit.
    async fn synthesize(
        &self,
        item: &SourceItem,
        record: &ProductionRecord,
    ) -> Result<ProductionRecord, SynthesisError> {
        let started = Instant::now();
        metrics::PRODUCTIONS_IN_FLIGHT.inc();

        let work_dir = self.config.temp_dir.join(Uuid::new_v4().to_string());
        let result = match tokio::fs::create_dir_all(&work_dir).await {
            Ok(()) => self.run_stages(item, record, &work_dir).await,
            Err(e) => Err(SynthesisError::Transient(format!(
                "creating work dir: {e}"
            ))),
        };
        // Per-attempt files go away on every exit path
        let _ = tokio::fs::remove_dir_all(&work_dir).await;

        metrics::PRODUCTIONS_IN_FLIGHT.dec();
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok((video_path, thumbnail_path)) => {
                self.queue
                    .mark_done(record.record_id, &video_path, &thumbnail_path)?;
                metrics::PRODUCTIONS_TOTAL.with_label_values(&["done"]).inc();
                metrics::PRODUCTION_DURATION
                    .with_label_values(&["done"])
                    .observe(elapsed);

                match self.scheduler.schedule_upload(record.source_id) {
                    Ok(slot) => info!(
                        source_id = record.source_id,
                        scheduled_time = %slot,
                        "Production finished and scheduled"
                    ),
                    Err(ScheduleError::AlreadyScheduled(_)) => debug!(
                        source_id = record.source_id,
                        "Production finished; upload was already scheduled"
                    ),
                    Err(e) => warn!(
                        source_id = record.source_id,
                        "Production finished but scheduling failed: {}", e
                    ),
                }

                Ok(self.queue.get(record.record_id)?)
            }
            Err(e) => {
                if let Err(store_err) = self.queue.mark_failed(record.record_id, &e.to_string())
                {
                    warn!(
                        record_id = record.record_id,
                        "Failed to record production failure: {}", store_err
                    );
                }
                metrics::PRODUCTIONS_TOTAL
                    .with_label_values(&["failed"])
                    .inc();
                metrics::PRODUCTION_DURATION
                    .with_label_values(&["failed"])
                    .observe(elapsed);
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        item: &SourceItem,
        record: &ProductionRecord,
        work_dir: &Path,
    ) -> Result<(String, String), SynthesisError> {
        let script = self
            .scripts
            .generate(item, record.track, record.quality_score)
            .await
            .map_err(|e| match e {
                ScriptError::Request(msg) => SynthesisError::Transient(msg),
                ScriptError::InvalidResponse(msg) | ScriptError::Validation(msg) => {
                    SynthesisError::Validation(msg)
                }
            })?;

        let parts = self.narration.narrate(&script, work_dir).await;
        if parts.is_empty() {
            return Err(SynthesisError::Validation(
                "no narratable script fields".to_string(),
            ));
        }

        let backgrounds = self
            .images
            .fetch(&item.title, BACKGROUND_IMAGE_COUNT, work_dir)
            .await;
        let timeline = build_timeline(&parts, backgrounds.len());

        let out_dir = self.config.output_dir.join(record.source_id.to_string());
        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(|e| SynthesisError::Transient(format!("creating output dir: {e}")))?;

        let assets = RenderAssets {
            backgrounds,
            bgm: self.config.bgm_path.clone(),
        };
        let rendered = self
            .renderer
            .render(&timeline, &assets, &out_dir)
            .await
            .map_err(|e| match e {
                ComposeError::Render(msg) => SynthesisError::Render(msg),
            })?;

        Ok((
            rendered.video_path.to_string_lossy().into_owned(),
            rendered.thumbnail_path.to_string_lossy().into_owned(),
        ))
    }
}
