//! Mock script model for testing.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::script::{ScriptError, ScriptModel};

/// Mock implementation of the [`ScriptModel`] trait. Returns a configured
/// response and records every prompt pair for assertions.
pub struct MockScriptModel {
    response: Mutex<String>,
    next_error: Mutex<Option<String>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl Default for MockScriptModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScriptModel {
    pub fn new() -> Self {
        Self {
            response: Mutex::new(crate::testing::fixtures::script_json().to_string()),
            next_error: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Set the raw text returned for subsequent completions.
    pub fn set_response(&self, response: &str) {
        *self.response.lock().unwrap() = response.to_string();
    }

    /// Make the next `complete` call fail; consumed once.
    pub fn set_next_error(&self, message: &str) {
        *self.next_error.lock().unwrap() = Some(message.to_string());
    }

    /// The most recent (system, user) prompt pair.
    pub fn last_request(&self) -> Option<(String, String)> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ScriptModel for MockScriptModel {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String, ScriptError> {
        if let Some(message) = self.next_error.lock().unwrap().take() {
            return Err(ScriptError::Request(message));
        }
        self.requests
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        Ok(self.response.lock().unwrap().clone())
    }
}
