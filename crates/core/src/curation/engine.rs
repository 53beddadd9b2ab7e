//! The curation engine itself.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CurationConfig;
use crate::embedding::Embedder;
use crate::metrics;
use crate::queue::{NewProduction, QueueStore, Track};
use crate::repository::{CandidateOrder, CandidateQuery, CandidateRepository, SourceItem};

use super::dedup::{fingerprint, DedupCorpus};
use super::scoring::composite_score;
use super::sentiment::reply_quality;
use super::trends::{trending_keywords, TrendingKeyword};

/// Articles examined for trend extraction per cycle.
const TREND_WINDOW: usize = 50;

/// Trending keywords kept per cycle.
const TREND_TOP_N: usize = 20;

/// How many candidates to admit per track in one cycle.
#[derive(Debug, Clone, Copy)]
pub struct CurationQuotas {
    pub agro: usize,
    pub info: usize,
}

/// One admitted candidate.
#[derive(Debug, Clone)]
pub struct SelectedCandidate {
    pub source_id: i64,
    pub track: Track,
    pub score: f64,
}

/// What a curation cycle did.
#[derive(Debug, Clone, Default)]
pub struct CurationReport {
    pub selected: Vec<SelectedCandidate>,
    pub skipped_duplicates: usize,
    pub skipped_low_score: usize,
}

/// Selects fresh articles into the production queue.
pub struct CurationEngine {
    repository: Arc<dyn CandidateRepository>,
    queue: Arc<dyn QueueStore>,
    embedder: Arc<dyn Embedder>,
    config: CurationConfig,
}

impl CurationEngine {
    pub fn new(
        repository: Arc<dyn CandidateRepository>,
        queue: Arc<dyn QueueStore>,
        embedder: Arc<dyn Embedder>,
        config: CurationConfig,
    ) -> Self {
        Self {
            repository,
            queue,
            embedder,
            config,
        }
    }

    /// Run one curation cycle.
    ///
    /// Failures of the repository or the embedding service degrade the cycle
    /// (skipped track, candidate treated as non-duplicate) but never abort it.
    pub async fn curate(&self, quotas: CurationQuotas, min_quality_score: f64) -> CurationReport {
        metrics::CURATION_CYCLES.inc();

        let mut corpus = DedupCorpus::new(self.config.similarity_threshold);
        self.seed_corpus(&mut corpus).await;

        let trends = match self.repository.recent(TREND_WINDOW) {
            Ok(items) => trending_keywords(&items, TREND_TOP_N),
            Err(e) => {
                warn!("Trend window unavailable, curating without trends: {}", e);
                Vec::new()
            }
        };

        let mut report = CurationReport::default();
        for (track, quota) in [(Track::Agro, quotas.agro), (Track::Info, quotas.info)] {
            if quota == 0 {
                continue;
            }
            self.curate_track(track, quota, min_quality_score, &trends, &mut corpus, &mut report)
                .await;
        }

        info!(
            selected = report.selected.len(),
            duplicates = report.skipped_duplicates,
            low_score = report.skipped_low_score,
            "Curation cycle finished"
        );
        report
    }

    /// Seed the corpus with fingerprints of everything already produced.
    async fn seed_corpus(&self, corpus: &mut DedupCorpus) {
        let done_ids = match self.queue.done_source_ids() {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Could not list produced sources for dedup seeding: {}", e);
                return;
            }
        };

        for id in done_ids {
            let item = match self.repository.get(id) {
                Ok(item) => item,
                // Source may have been purged upstream; nothing to seed from
                Err(_) => continue,
            };
            let text = fingerprint(&item);
            match self.embedder.encode(&text).await {
                Ok(embedding) => corpus.insert(text, embedding),
                Err(e) => {
                    warn!(source_id = id, "Skipping corpus entry, embedding failed: {}", e);
                }
            }
        }
        debug!(entries = corpus.len(), "Dedup corpus seeded");
    }

    async fn curate_track(
        &self,
        track: Track,
        quota: usize,
        min_quality_score: f64,
        trends: &[TrendingKeyword],
        corpus: &mut DedupCorpus,
        report: &mut CurationReport,
    ) {
        let exclude = match self.queue.active_source_ids() {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Could not list active sources, skipping {} track: {}", track.as_str(), e);
                return;
            }
        };

        let query = self.track_query(track).with_excluded(exclude);
        let candidates = match self.repository.candidates(&query) {
            Ok(items) => items,
            Err(e) => {
                warn!("Repository unavailable, skipping {} track: {}", track.as_str(), e);
                return;
            }
        };

        let mut scored: Vec<(SourceItem, f64)> = candidates
            .into_iter()
            .map(|item| {
                let replies = self.repository.reply_texts(item.id).unwrap_or_default();
                let score = composite_score(&item, reply_quality(&replies), trends);
                (item, score)
            })
            .collect();
        // Deterministic order: best score first, newest article on ties
        scored.sort_by(|(a, sa), (b, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.id.cmp(&a.id))
        });

        let mut admitted = 0;
        for (item, score) in scored {
            if admitted >= quota {
                break;
            }
            if score < min_quality_score {
                report.skipped_low_score += 1;
                metrics::CURATION_SKIPPED.with_label_values(&["low_score"]).inc();
                continue;
            }

            let text = fingerprint(&item);
            let embedding = match self.embedder.encode(&text).await {
                Ok(v) => Some(v),
                Err(e) => {
                    // Fail open: an unavailable embedder must not stall curation
                    warn!(source_id = item.id, "Embedding failed, admitting unchecked: {}", e);
                    None
                }
            };

            if let Some(ref embedding) = embedding {
                if let Some(existing) = corpus.is_duplicate(embedding) {
                    debug!(
                        source_id = item.id,
                        matched = existing,
                        "Skipping near-duplicate candidate"
                    );
                    report.skipped_duplicates += 1;
                    metrics::CURATION_SKIPPED.with_label_values(&["duplicate"]).inc();
                    continue;
                }
            }

            let new = NewProduction::new(item.id, track).with_quality(score);
            match self.queue.enqueue(&new) {
                Ok(true) => {
                    if let Some(embedding) = embedding {
                        corpus.insert(text, embedding);
                    }
                    metrics::CURATION_SELECTED
                        .with_label_values(&[track.as_str()])
                        .inc();
                    report.selected.push(SelectedCandidate {
                        source_id: item.id,
                        track,
                        score,
                    });
                    admitted += 1;
                }
                Ok(false) => {
                    debug!(source_id = item.id, "Candidate already queued, skipping");
                }
                Err(e) => {
                    warn!(source_id = item.id, "Enqueue failed: {}", e);
                }
            }
        }
    }

    fn track_query(&self, track: Track) -> CandidateQuery {
        match track {
            Track::Agro => CandidateQuery::new(
                self.config.min_body_chars,
                self.config.min_popularity.max(self.config.agro_min_popularity),
                CandidateOrder::PopularityDesc,
            )
            .with_limit(self.config.fetch_limit),
            Track::Info => CandidateQuery::new(
                self.config.min_body_chars.max(self.config.info_min_body_chars),
                self.config.min_popularity,
                CandidateOrder::BodyLengthDesc,
            )
            .with_limit(self.config.fetch_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::{ProductionStatus, SqliteQueueStore};
    use crate::repository::{RepositoryError, SqliteArticleRepository};
    use crate::testing::MockEmbedder;
    use chrono::Utc;

    fn make_item(id: i64, title: &str, popularity: i64) -> SourceItem {
        SourceItem {
            id,
            title: title.to_string(),
            body: "b".repeat(600),
            popularity,
            reply_count: 0,
            persona: None,
            created_at: Utc::now(),
        }
    }

    struct Harness {
        repository: Arc<SqliteArticleRepository>,
        queue: Arc<SqliteQueueStore>,
        embedder: Arc<MockEmbedder>,
        engine: CurationEngine,
    }

    fn make_harness() -> Harness {
        let repository = Arc::new(SqliteArticleRepository::in_memory().unwrap());
        let queue = Arc::new(SqliteQueueStore::in_memory().unwrap());
        let embedder = Arc::new(MockEmbedder::new());
        let engine = CurationEngine::new(
            Arc::clone(&repository) as Arc<dyn CandidateRepository>,
            Arc::clone(&queue) as Arc<dyn QueueStore>,
            Arc::clone(&embedder) as Arc<dyn Embedder>,
            CurationConfig::default(),
        );
        Harness {
            repository,
            queue,
            embedder,
            engine,
        }
    }

    #[tokio::test]
    async fn test_curate_fills_quota_with_best_candidates() {
        let h = make_harness();
        h.repository.upsert_article(&make_item(1, "A", 200)).unwrap();
        h.repository.upsert_article(&make_item(2, "B", 900)).unwrap();
        h.repository.upsert_article(&make_item(3, "C", 500)).unwrap();

        let report = h
            .engine
            .curate(CurationQuotas { agro: 2, info: 0 }, 0.0)
            .await;

        assert_eq!(report.selected.len(), 2);
        let ids: Vec<i64> = report.selected.iter().map(|s| s.source_id).collect();
        assert!(ids.contains(&2));
        assert_eq!(
            h.queue.count_by_status(ProductionStatus::Pending).unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_curate_skips_near_duplicates_within_cycle() {
        let h = make_harness();
        let first = make_item(1, "Same story", 900);
        let second = make_item(2, "Same story", 800);
        h.repository.upsert_article(&first).unwrap();
        h.repository.upsert_article(&second).unwrap();

        // Identical embeddings for both fingerprints
        h.embedder.set_embedding(&fingerprint(&first), vec![1.0, 0.0]);
        h.embedder.set_embedding(&fingerprint(&second), vec![1.0, 0.0]);

        let report = h
            .engine
            .curate(CurationQuotas { agro: 5, info: 0 }, 0.0)
            .await;

        assert_eq!(report.selected.len(), 1);
        assert_eq!(report.skipped_duplicates, 1);
        // The newer article wins the tie and is admitted first
        assert_eq!(report.selected[0].source_id, 2);
    }

    #[tokio::test]
    async fn test_corpus_seeded_from_done_productions() {
        let h = make_harness();
        let produced = make_item(1, "Already shipped", 900);
        let newcomer = make_item(2, "Fresh angle", 800);
        h.repository.upsert_article(&produced).unwrap();
        h.repository.upsert_article(&newcomer).unwrap();

        h.queue.enqueue(&NewProduction::new(1, Track::Agro)).unwrap();
        let record = h.queue.latest(1).unwrap().unwrap();
        h.queue.mark_done(record.record_id, "/v.mp4", "/t.jpg").unwrap();

        // Newcomer embeds identically to the produced article
        h.embedder.set_embedding(&fingerprint(&produced), vec![1.0, 0.0]);
        h.embedder.set_embedding(&fingerprint(&newcomer), vec![1.0, 0.0]);

        let report = h
            .engine
            .curate(CurationQuotas { agro: 5, info: 0 }, 0.0)
            .await;

        assert!(report.selected.is_empty());
        assert_eq!(report.skipped_duplicates, 1);
    }

    #[tokio::test]
    async fn test_min_quality_score_filters() {
        let h = make_harness();
        h.repository.upsert_article(&make_item(1, "Meh", 150)).unwrap();

        let report = h
            .engine
            .curate(CurationQuotas { agro: 5, info: 0 }, 9.5)
            .await;

        assert!(report.selected.is_empty());
        assert_eq!(report.skipped_low_score, 1);
        assert_eq!(
            h.queue.count_by_status(ProductionStatus::Pending).unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_embedding_failure_admits_candidate() {
        let h = make_harness();
        h.repository.upsert_article(&make_item(1, "Solo", 900)).unwrap();
        h.embedder.set_next_error("embedding service down");

        let report = h
            .engine
            .curate(CurationQuotas { agro: 1, info: 0 }, 0.0)
            .await;

        assert_eq!(report.selected.len(), 1);
        assert_eq!(report.skipped_duplicates, 0);
    }

    #[tokio::test]
    async fn test_sources_with_live_records_are_excluded() {
        let h = make_harness();
        h.repository.upsert_article(&make_item(1, "Queued", 900)).unwrap();
        h.repository.upsert_article(&make_item(2, "Free", 800)).unwrap();
        h.queue.enqueue(&NewProduction::new(1, Track::Agro)).unwrap();

        let report = h
            .engine
            .curate(CurationQuotas { agro: 5, info: 0 }, 0.0)
            .await;

        let ids: Vec<i64> = report.selected.iter().map(|s| s.source_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_repository_failure_yields_empty_cycle() {
        struct BrokenRepository;

        impl CandidateRepository for BrokenRepository {
            fn get(&self, id: i64) -> Result<SourceItem, RepositoryError> {
                Err(RepositoryError::NotFound(id))
            }
            fn exists(&self, _id: i64) -> Result<bool, RepositoryError> {
                Err(RepositoryError::Database("down".to_string()))
            }
            fn candidates(
                &self,
                _query: &CandidateQuery,
            ) -> Result<Vec<SourceItem>, RepositoryError> {
                Err(RepositoryError::Database("down".to_string()))
            }
            fn reply_texts(&self, _article_id: i64) -> Result<Vec<String>, RepositoryError> {
                Err(RepositoryError::Database("down".to_string()))
            }
            fn recent(&self, _limit: usize) -> Result<Vec<SourceItem>, RepositoryError> {
                Err(RepositoryError::Database("down".to_string()))
            }
        }

        let queue = Arc::new(SqliteQueueStore::in_memory().unwrap());
        let engine = CurationEngine::new(
            Arc::new(BrokenRepository),
            Arc::clone(&queue) as Arc<dyn QueueStore>,
            Arc::new(MockEmbedder::new()),
            CurationConfig::default(),
        );

        let report = engine.curate(CurationQuotas { agro: 2, info: 2 }, 0.0).await;

        assert!(report.selected.is_empty());
        assert_eq!(queue.count_by_status(ProductionStatus::Pending).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_info_track_prefers_depth() {
        let h = make_harness();
        let mut deep = make_item(1, "Deep", 60);
        deep.body = "d".repeat(3000);
        let mut shallow = make_item(2, "Shallow", 60);
        shallow.body = "s".repeat(600);
        h.repository.upsert_article(&deep).unwrap();
        h.repository.upsert_article(&shallow).unwrap();

        let report = h
            .engine
            .curate(CurationQuotas { agro: 0, info: 1 }, 0.0)
            .await;

        assert_eq!(report.selected.len(), 1);
        assert_eq!(report.selected[0].track, Track::Info);
    }
}
