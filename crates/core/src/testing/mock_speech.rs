//! Mock speech service for testing narration fallback behavior.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;

use crate::narration::{NarrationError, SpeechAudio, SpeechService};

#[derive(Debug, Clone, Copy)]
enum FailMode {
    Never,
    Always,
    /// Fail this many calls, then succeed.
    Times(u32),
}

/// Mock implementation of the [`SpeechService`] trait with scripted failures.
pub struct MockSpeechService {
    label: &'static str,
    fail_mode: Mutex<FailMode>,
    calls: Mutex<u32>,
}

impl MockSpeechService {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            fail_mode: Mutex::new(FailMode::Never),
            calls: Mutex::new(0),
        }
    }

    /// Every call fails.
    pub fn fail_always(&self) {
        *self.fail_mode.lock().unwrap() = FailMode::Always;
    }

    /// The next `count` calls fail, then calls succeed.
    pub fn fail_times(&self, count: u32) {
        *self.fail_mode.lock().unwrap() = FailMode::Times(count);
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }

    fn should_fail(&self) -> bool {
        let mut mode = self.fail_mode.lock().unwrap();
        match *mode {
            FailMode::Never => false,
            FailMode::Always => true,
            FailMode::Times(0) => false,
            FailMode::Times(n) => {
                *mode = FailMode::Times(n - 1);
                true
            }
        }
    }
}

#[async_trait]
impl SpeechService for MockSpeechService {
    fn name(&self) -> &'static str {
        self.label
    }

    async fn synthesize(
        &self,
        text: &str,
        out_path: &Path,
    ) -> Result<SpeechAudio, NarrationError> {
        *self.calls.lock().unwrap() += 1;
        if self.should_fail() {
            return Err(NarrationError::Service(format!(
                "{} refused to speak",
                self.label
            )));
        }
        Ok(SpeechAudio {
            path: out_path.to_path_buf(),
            duration_secs: (text.split_whitespace().count() as f64 * 0.4).max(0.5),
        })
    }
}
