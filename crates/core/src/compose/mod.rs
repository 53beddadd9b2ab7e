//! Composition stage: deterministic timeline assembly and the rendering seam.

mod ffmpeg;
mod images;
mod timeline;

pub use ffmpeg::*;
pub use images::*;
pub use timeline::*;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Rendering failed: {0}")]
    Render(String),
}

/// Final artifacts produced by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVideo {
    pub video_path: PathBuf,
    pub thumbnail_path: PathBuf,
}

/// Visual assets handed to the renderer alongside the timeline.
#[derive(Debug, Clone, Default)]
pub struct RenderAssets {
    /// Background images cycled across segments; may be empty, in which case
    /// the renderer falls back to solid slates.
    pub backgrounds: Vec<PathBuf>,
    /// Music bed looped under the whole video at the timeline's bed volume.
    pub bgm: Option<PathBuf>,
}

/// Turns a timeline plus assets into a video file and a thumbnail.
///
/// The composition stage owns WHAT plays WHEN; the renderer owns pixels and
/// audio mixing.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        timeline: &Timeline,
        assets: &RenderAssets,
        out_dir: &Path,
    ) -> Result<RenderedVideo, ComposeError>;
}
