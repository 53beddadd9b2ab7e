//! Narration degradation as an explicit state machine.
//!
//! Per script beat: up to N primary attempts with exponential backoff, one
//! secondary attempt, then a fixed-duration silent placeholder. Degradation
//! never fails the beat; the worst case is a caption-only segment.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::SynthesisConfig;
use crate::metrics;
use crate::script::ShortScript;

use super::{NarrationPart, SpeechService};

/// Where narration of one beat currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationState {
    /// Attempting the primary backend; attempts are 1-based.
    TryPrimary { attempt: u32 },
    /// Primary exhausted, one shot at the secondary backend.
    TrySecondary,
    /// All backends exhausted, emit the silent placeholder.
    Placeholder,
    Done,
}

/// Outcome of one synthesis attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationEvent {
    Success,
    Failure,
}

/// Pure transition function.
pub fn next_state(
    state: NarrationState,
    event: NarrationEvent,
    max_retries: u32,
    has_secondary: bool,
) -> NarrationState {
    match (state, event) {
        (NarrationState::TryPrimary { .. }, NarrationEvent::Success) => NarrationState::Done,
        (NarrationState::TryPrimary { attempt }, NarrationEvent::Failure) => {
            if attempt < max_retries {
                NarrationState::TryPrimary {
                    attempt: attempt + 1,
                }
            } else if has_secondary {
                NarrationState::TrySecondary
            } else {
                NarrationState::Placeholder
            }
        }
        (NarrationState::TrySecondary, NarrationEvent::Success) => NarrationState::Done,
        (NarrationState::TrySecondary, NarrationEvent::Failure) => NarrationState::Placeholder,
        // Placeholder emission cannot fail; Done is terminal
        (NarrationState::Placeholder, _) => NarrationState::Done,
        (NarrationState::Done, _) => NarrationState::Done,
    }
}

/// Backoff before primary attempt `attempt` (no delay before the first).
pub fn backoff_delay(attempt: u32, base_secs: f64) -> Duration {
    if attempt <= 1 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(base_secs * f64::from(2u32.pow(attempt - 2)))
}

/// Runs the state machine over a whole script.
pub struct NarrationStage {
    primary: Arc<dyn SpeechService>,
    secondary: Option<Arc<dyn SpeechService>>,
    config: SynthesisConfig,
}

impl NarrationStage {
    pub fn new(
        primary: Arc<dyn SpeechService>,
        secondary: Option<Arc<dyn SpeechService>>,
        config: SynthesisConfig,
    ) -> Self {
        Self {
            primary,
            secondary,
            config,
        }
    }

    /// Narrate every usable beat of the script. Beats shorter than the
    /// configured minimum are skipped entirely.
    pub async fn narrate(&self, script: &ShortScript, work_dir: &Path) -> Vec<NarrationPart> {
        let mut parts = Vec::new();
        for (index, (field, text)) in script.parts().into_iter().enumerate() {
            if text.chars().count() < self.config.min_field_chars {
                debug!(field, "Skipping beat below minimum length");
                continue;
            }
            let out_path = work_dir.join(format!("{index:02}_{field}.mp3"));
            parts.push(self.narrate_beat(field, text, &out_path).await);
        }
        parts
    }

    async fn narrate_beat(
        &self,
        field: &'static str,
        text: &str,
        out_path: &Path,
    ) -> NarrationPart {
        let max_retries = self.config.max_narration_retries;
        let has_secondary = self.secondary.is_some();
        let mut state = NarrationState::TryPrimary { attempt: 1 };

        loop {
            match state {
                NarrationState::TryPrimary { attempt } => {
                    let delay = backoff_delay(attempt, self.config.retry_base_delay_secs);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    match self.primary.synthesize(text, out_path).await {
                        Ok(audio) => {
                            return NarrationPart {
                                field,
                                caption: text.to_string(),
                                duration_secs: audio.duration_secs,
                                audio: Some(audio),
                            };
                        }
                        Err(e) => {
                            warn!(
                                field,
                                attempt,
                                backend = self.primary.name(),
                                "Narration attempt failed: {}",
                                e
                            );
                            state = next_state(
                                state,
                                NarrationEvent::Failure,
                                max_retries,
                                has_secondary,
                            );
                        }
                    }
                }
                NarrationState::TrySecondary => {
                    metrics::NARRATION_FALLBACKS
                        .with_label_values(&["secondary"])
                        .inc();
                    // has_secondary gated the transition into this state
                    let secondary = self.secondary.as_ref().unwrap();
                    match secondary.synthesize(text, out_path).await {
                        Ok(audio) => {
                            return NarrationPart {
                                field,
                                caption: text.to_string(),
                                duration_secs: audio.duration_secs,
                                audio: Some(audio),
                            };
                        }
                        Err(e) => {
                            warn!(
                                field,
                                backend = secondary.name(),
                                "Secondary narration failed: {}",
                                e
                            );
                            state = next_state(
                                state,
                                NarrationEvent::Failure,
                                max_retries,
                                has_secondary,
                            );
                        }
                    }
                }
                NarrationState::Placeholder => {
                    metrics::NARRATION_FALLBACKS
                        .with_label_values(&["placeholder"])
                        .inc();
                    warn!(field, "All narration backends failed, emitting placeholder");
                    return NarrationPart {
                        field,
                        caption: text.to_string(),
                        audio: None,
                        duration_secs: self.config.placeholder_secs,
                    };
                }
                NarrationState::Done => unreachable!("terminal state inside loop"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::ShortScript;
    use crate::testing::MockSpeechService;

    fn make_script() -> ShortScript {
        ShortScript {
            hook: "A striking opener".to_string(),
            core_summary: "The heart of the story".to_string(),
            controversy_point: "The spicy part".to_string(),
            comment_trigger: "Your move".to_string(),
        }
    }

    fn make_config() -> SynthesisConfig {
        SynthesisConfig::default()
    }

    #[test]
    fn test_transitions_primary_retry() {
        let s = next_state(
            NarrationState::TryPrimary { attempt: 1 },
            NarrationEvent::Failure,
            3,
            true,
        );
        assert_eq!(s, NarrationState::TryPrimary { attempt: 2 });
    }

    #[test]
    fn test_transitions_primary_exhausted_to_secondary() {
        let s = next_state(
            NarrationState::TryPrimary { attempt: 3 },
            NarrationEvent::Failure,
            3,
            true,
        );
        assert_eq!(s, NarrationState::TrySecondary);
    }

    #[test]
    fn test_transitions_primary_exhausted_without_secondary() {
        let s = next_state(
            NarrationState::TryPrimary { attempt: 3 },
            NarrationEvent::Failure,
            3,
            false,
        );
        assert_eq!(s, NarrationState::Placeholder);
    }

    #[test]
    fn test_transitions_secondary_failure_to_placeholder() {
        let s = next_state(NarrationState::TrySecondary, NarrationEvent::Failure, 3, true);
        assert_eq!(s, NarrationState::Placeholder);
    }

    #[test]
    fn test_transitions_success_is_terminal() {
        for state in [
            NarrationState::TryPrimary { attempt: 2 },
            NarrationState::TrySecondary,
        ] {
            assert_eq!(
                next_state(state, NarrationEvent::Success, 3, true),
                NarrationState::Done
            );
        }
    }

    #[test]
    fn test_backoff_schedule() {
        assert_eq!(backoff_delay(1, 2.0), Duration::ZERO);
        assert_eq!(backoff_delay(2, 2.0), Duration::from_secs(2));
        assert_eq!(backoff_delay(3, 2.0), Duration::from_secs(4));
        assert_eq!(backoff_delay(4, 2.0), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_narrate_happy_path() {
        let primary = Arc::new(MockSpeechService::new("primary"));
        let stage = NarrationStage::new(primary.clone(), None, make_config());

        let parts = stage
            .narrate(&make_script(), Path::new("/tmp/narration-test"))
            .await;

        assert_eq!(parts.len(), 4);
        assert!(parts.iter().all(|p| !p.is_placeholder()));
        assert_eq!(primary.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_narrate_falls_back_to_secondary_then_placeholder() {
        let primary = Arc::new(MockSpeechService::new("primary"));
        primary.fail_always();
        let secondary = Arc::new(MockSpeechService::new("secondary"));
        secondary.fail_always();
        let stage = NarrationStage::new(
            primary.clone(),
            Some(secondary.clone()),
            make_config(),
        );

        let script = ShortScript {
            hook: "A striking opener".to_string(),
            core_summary: "tiny".to_string(), // below min length, skipped
            controversy_point: "tiny".to_string(),
            comment_trigger: "tiny".to_string(),
        };
        let parts = stage.narrate(&script, Path::new("/tmp/narration-test")).await;

        // Exactly three primary attempts, then exactly one secondary attempt
        assert_eq!(primary.call_count(), 3);
        assert_eq!(secondary.call_count(), 1);

        assert_eq!(parts.len(), 1);
        assert!(parts[0].is_placeholder());
        assert_eq!(parts[0].duration_secs, 5.0);
        assert_eq!(parts[0].caption, "A striking opener");
    }

    #[tokio::test(start_paused = true)]
    async fn test_narrate_recovers_on_retry() {
        let primary = Arc::new(MockSpeechService::new("primary"));
        primary.fail_times(2);
        let stage = NarrationStage::new(primary.clone(), None, make_config());

        let script = ShortScript {
            hook: "A striking opener".to_string(),
            core_summary: "tiny".to_string(),
            controversy_point: "tiny".to_string(),
            comment_trigger: "tiny".to_string(),
        };
        let parts = stage.narrate(&script, Path::new("/tmp/narration-test")).await;

        assert_eq!(primary.call_count(), 3);
        assert_eq!(parts.len(), 1);
        assert!(!parts[0].is_placeholder());
    }

    #[tokio::test(start_paused = true)]
    async fn test_narrate_secondary_rescues() {
        let primary = Arc::new(MockSpeechService::new("primary"));
        primary.fail_always();
        let secondary = Arc::new(MockSpeechService::new("secondary"));
        let stage =
            NarrationStage::new(primary.clone(), Some(secondary.clone()), make_config());

        let script = ShortScript {
            hook: "A striking opener".to_string(),
            core_summary: "tiny".to_string(),
            controversy_point: "tiny".to_string(),
            comment_trigger: "tiny".to_string(),
        };
        let parts = stage.narrate(&script, Path::new("/tmp/narration-test")).await;

        assert_eq!(parts.len(), 1);
        assert!(!parts[0].is_placeholder());
        assert_eq!(secondary.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_narrate_skips_short_fields() {
        let primary = Arc::new(MockSpeechService::new("primary"));
        let stage = NarrationStage::new(primary.clone(), None, make_config());

        let script = ShortScript {
            hook: "Long enough to narrate".to_string(),
            core_summary: "abc".to_string(),
            controversy_point: "Also long enough".to_string(),
            comment_trigger: "x".to_string(),
        };
        let parts = stage.narrate(&script, Path::new("/tmp/narration-test")).await;

        let fields: Vec<&str> = parts.iter().map(|p| p.field).collect();
        assert_eq!(fields, vec!["hook", "controversy_point"]);
    }
}
