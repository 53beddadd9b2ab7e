//! Mock renderer for testing.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;

use crate::compose::{ComposeError, RenderAssets, RenderedVideo, Renderer, Timeline};

/// Mock implementation of the [`Renderer`] trait. Fabricates artifact paths
/// under the requested output directory and records every timeline.
#[derive(Default)]
pub struct MockRenderer {
    timelines: Mutex<Vec<Timeline>>,
    next_error: Mutex<Option<String>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `render` call fail; consumed once.
    pub fn set_next_error(&self, message: &str) {
        *self.next_error.lock().unwrap() = Some(message.to_string());
    }

    /// Timelines rendered so far, in order.
    pub fn rendered_timelines(&self) -> Vec<Timeline> {
        self.timelines.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn render(
        &self,
        timeline: &Timeline,
        _assets: &RenderAssets,
        out_dir: &Path,
    ) -> Result<RenderedVideo, ComposeError> {
        if let Some(message) = self.next_error.lock().unwrap().take() {
            return Err(ComposeError::Render(message));
        }
        self.timelines.lock().unwrap().push(timeline.clone());
        Ok(RenderedVideo {
            video_path: out_dir.join("video.mp4"),
            thumbnail_path: out_dir.join("thumbnail.jpg"),
        })
    }
}
