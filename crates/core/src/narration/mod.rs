//! Narration stage: text-to-speech with retry, fallback, and placeholder
//! degradation.

mod fsm;
mod remote;
mod tempo;
mod types;

pub use fsm::*;
pub use remote::*;
pub use tempo::*;
pub use types::*;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("Speech synthesis failed: {0}")]
    Service(String),
}

/// One text-to-speech backend.
#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Backend label used in logs.
    fn name(&self) -> &'static str;

    /// Synthesize `text` into an audio file at `out_path`.
    async fn synthesize(&self, text: &str, out_path: &Path)
        -> Result<SpeechAudio, NarrationError>;
}
