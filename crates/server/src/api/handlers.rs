//! Health, config, and status handlers.

use axum::{extract::State, Json};
use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;
use std::sync::Arc;

use clipforge_core::queue::ProductionStatus;

use super::{ok, ApiError};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    ok(state.sanitized_config())
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub orchestrator_running: bool,
    pub in_flight: usize,
    pub pending_count: u64,
    pub done_count: u64,
    pub failed_count: u64,
    /// Uploads booked on the current calendar day, in the publication zone.
    pub scheduled_today: usize,
}

pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let queue = state.queue();
    let pending = queue
        .count_by_status(ProductionStatus::Pending)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let done = queue
        .count_by_status(ProductionStatus::Done)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    let failed = queue
        .count_by_status(ProductionStatus::Failed)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let offset = FixedOffset::east_opt(state.config().scheduler.utc_offset_hours * 3600)
        .unwrap_or_else(|| Utc.fix());
    let today = Utc::now().with_timezone(&offset).date_naive();
    let scheduled_today = state
        .schedule()
        .scheduled_times()
        .map_err(|e| ApiError::internal(e.to_string()))?
        .iter()
        .filter(|t| t.with_timezone(&offset).date_naive() == today)
        .count();

    Ok(ok(StatusResponse {
        orchestrator_running: state
            .orchestrator()
            .map(|o| o.status().running)
            .unwrap_or(false),
        in_flight: state.registry().active_count(),
        pending_count: pending,
        done_count: done,
        failed_count: failed,
        scheduled_today,
    }))
}
