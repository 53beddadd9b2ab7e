//! Curation and production handlers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use clipforge_core::curation::CurationQuotas;

use super::{ok, ApiError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CurateRequest {
    /// Reaction-track admissions; defaults to the orchestrator quota.
    #[serde(default)]
    pub agro_quota: Option<usize>,
    /// Explainer-track admissions; defaults to the orchestrator quota.
    #[serde(default)]
    pub info_quota: Option<usize>,
    #[serde(default)]
    pub min_quality_score: Option<f64>,
}

#[derive(Serialize)]
pub struct SelectedResponse {
    pub source_id: i64,
    pub track: &'static str,
    pub score: f64,
}

#[derive(Serialize)]
pub struct CurateResponse {
    pub selected: Vec<SelectedResponse>,
    pub skipped_duplicates: usize,
    pub skipped_low_score: usize,
}

/// Run one curation cycle on demand.
pub async fn curate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CurateRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let curation = state
        .curation()
        .ok_or_else(|| ApiError::unavailable("Curation not available: embedding service not configured"))?;
    let defaults = &state.config().orchestrator;
    let quotas = CurationQuotas {
        agro: request.agro_quota.unwrap_or(defaults.agro_quota),
        info: request.info_quota.unwrap_or(defaults.info_quota),
    };
    let min_score = request
        .min_quality_score
        .unwrap_or(defaults.min_quality_score);

    info!(agro = quotas.agro, info = quotas.info, min_score, "Curation requested via API");
    let report = curation.curate(quotas, min_score).await;

    Ok(ok(CurateResponse {
        selected: report
            .selected
            .iter()
            .map(|s| SelectedResponse {
                source_id: s.source_id,
                track: s.track.as_str(),
                score: s.score,
            })
            .collect(),
        skipped_duplicates: report.skipped_duplicates,
        skipped_low_score: report.skipped_low_score,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ProduceRequest {
    pub source_id: i64,
}

/// Produce one video on demand. Runs inline; the response carries the
/// finished (or already-finished) production record.
pub async fn produce(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProduceRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let synthesizer = state
        .synthesizer()
        .ok_or_else(|| ApiError::unavailable("Production not available: script or speech service not configured"))?;

    info!(source_id = request.source_id, "Production requested via API");
    let record = synthesizer.produce(request.source_id).await?;
    Ok(ok(record))
}
