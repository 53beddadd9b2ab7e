use std::path::PathBuf;

/// Synthesized audio for one script beat.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAudio {
    pub path: PathBuf,
    pub duration_secs: f64,
}

/// Narration result for one script beat.
///
/// `audio` is absent when every backend failed and the beat degraded to a
/// caption-only placeholder of fixed duration.
#[derive(Debug, Clone)]
pub struct NarrationPart {
    pub field: &'static str,
    pub caption: String,
    pub audio: Option<SpeechAudio>,
    pub duration_secs: f64,
}

impl NarrationPart {
    pub fn is_placeholder(&self) -> bool {
        self.audio.is_none()
    }
}
