//! HTTP text-to-speech client (OpenAI-compatible audio endpoint).

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use super::{NarrationError, SpeechAudio, SpeechService};
use crate::config::SpeechEndpoint;

/// Spoken words per second assumed when the backend reports no duration.
const SPEECH_WORDS_PER_SEC: f64 = 2.5;

/// Speech backend over an OpenAI-compatible `/v1/audio/speech` endpoint.
pub struct RemoteSpeechClient {
    label: &'static str,
    config: SpeechEndpoint,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
}

impl RemoteSpeechClient {
    pub fn new(label: &'static str, config: SpeechEndpoint) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .unwrap_or_default();
        Self {
            label,
            config,
            client,
        }
    }
}

#[async_trait]
impl SpeechService for RemoteSpeechClient {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn synthesize(
        &self,
        text: &str,
        out_path: &Path,
    ) -> Result<SpeechAudio, NarrationError> {
        let url = format!("{}/v1/audio/speech", self.config.url.trim_end_matches('/'));

        let mut request = self.client.post(&url).json(&SpeechRequest {
            model: "tts-1",
            input: text,
            voice: &self.config.voice,
        });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NarrationError::Service(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NarrationError::Service(format!(
                "speech endpoint returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| NarrationError::Service(e.to_string()))?;
        if bytes.is_empty() {
            return Err(NarrationError::Service("empty audio payload".to_string()));
        }

        tokio::fs::write(out_path, &bytes)
            .await
            .map_err(|e| NarrationError::Service(format!("writing audio file: {e}")))?;

        // The endpoint returns raw audio with no duration metadata; estimate
        // from word count until composition measures the real file.
        let words = text.split_whitespace().count();
        let duration_secs = (words as f64 / SPEECH_WORDS_PER_SEC).max(0.5);

        Ok(SpeechAudio {
            path: out_path.to_path_buf(),
            duration_secs,
        })
    }
}
