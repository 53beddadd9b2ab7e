//! Script model abstraction and OpenAI-compatible client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ScriptError;
use crate::config::ScriptConfig;

/// Trait for script-writing chat models.
#[async_trait]
pub trait ScriptModel: Send + Sync {
    /// Model name (e.g., "gpt-4o-mini")
    fn model(&self) -> &str;

    /// Send a system + user prompt pair and get the raw text response.
    async fn complete(&self, system: &str, user: &str) -> Result<String, ScriptError>;
}

/// Client for OpenAI-compatible `/v1/chat/completions` endpoints.
pub struct OpenAiChatClient {
    config: ScriptConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenAiChatClient {
    pub fn new(config: ScriptConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }
}

#[async_trait]
impl ScriptModel for OpenAiChatClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, ScriptError> {
        let request = ChatRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let url = format!(
            "{}/v1/chat/completions",
            self.config.url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScriptError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScriptError::Request(format!(
                "script endpoint returned {}",
                response.status()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ScriptError::InvalidResponse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ScriptError::InvalidResponse("no choices in response".to_string()))
    }
}
