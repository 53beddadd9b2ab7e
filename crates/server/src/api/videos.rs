//! Finished video artifact listing and removal.
//!
//! Artifacts live under the output directory, one subdirectory per source id
//! holding `video.mp4` and `thumbnail.jpg`.

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::{ok, ApiError};
use crate::state::AppState;

#[derive(Serialize)]
pub struct VideoEntry {
    pub name: String,
    pub has_video: bool,
    pub has_thumbnail: bool,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// A name is deletable only when it cannot escape the output directory.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !name.contains("..")
}

pub async fn list_videos(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let output_dir = state.config().synthesis.output_dir.clone();

    let mut entries = Vec::new();
    let mut dir = match tokio::fs::read_dir(&output_dir).await {
        Ok(dir) => dir,
        // Nothing produced yet
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ok(entries)),
        Err(e) => return Err(ApiError::internal(format!("cannot read {:?}: {}", output_dir, e))),
    };

    while let Ok(Some(entry)) = dir.next_entry().await {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let video = path.join("video.mp4");
        let video_meta = tokio::fs::metadata(&video).await.ok();
        entries.push(VideoEntry {
            name,
            has_video: video_meta.is_some(),
            has_thumbnail: tokio::fs::metadata(path.join("thumbnail.jpg")).await.is_ok(),
            size_bytes: video_meta.as_ref().map(|m| m.len()).unwrap_or(0),
            modified: video_meta
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Utc>::from),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(ok(entries))
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: String,
}

pub async fn delete_video(
    State(state): State<Arc<AppState>>,
    AxumPath(name): AxumPath<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !is_safe_name(&name) {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Invalid artifact name: {}", name),
        ));
    }

    let target = state.config().synthesis.output_dir.join(&name);
    remove_entry(&target).await?;
    info!(name = %name, "Deleted video artifact");
    Ok(ok(DeleteResponse { deleted: name }))
}

async fn remove_entry(target: &Path) -> Result<(), ApiError> {
    let meta = tokio::fs::metadata(target).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::not_found(format!("No such artifact: {:?}", target.file_name()))
        } else {
            ApiError::internal(e.to_string())
        }
    })?;

    let result = if meta.is_dir() {
        tokio::fs::remove_dir_all(target).await
    } else {
        tokio::fs::remove_file(target).await
    };
    result.map_err(|e| ApiError::internal(e.to_string()))
}
