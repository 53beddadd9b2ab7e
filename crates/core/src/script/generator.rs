//! Prompt assembly and script generation.

use std::sync::Arc;

use tracing::debug;

use crate::queue::Track;
use crate::repository::SourceItem;

use super::sanitize::sanitize;
use super::types::{parse_script, ShortScript};
use super::{ScriptError, ScriptModel};

/// Characters of article body handed to the model.
const BODY_PROMPT_CHARS: usize = 1500;

/// Generates validated, sanitized scripts from articles.
pub struct ScriptGenerator {
    model: Arc<dyn ScriptModel>,
}

impl ScriptGenerator {
    pub fn new(model: Arc<dyn ScriptModel>) -> Self {
        Self { model }
    }

    pub async fn generate(
        &self,
        item: &SourceItem,
        track: Track,
        quality_score: f64,
    ) -> Result<ShortScript, ScriptError> {
        let system = system_prompt(track);
        let user = user_prompt(item, quality_score);

        debug!(source_id = item.id, model = self.model.model(), "Requesting script");
        let raw = self.model.complete(&system, &user).await?;
        let script = parse_script(&raw)?;

        let cleaned = ShortScript {
            hook: sanitize(&script.hook),
            core_summary: sanitize(&script.core_summary),
            controversy_point: sanitize(&script.controversy_point),
            comment_trigger: sanitize(&script.comment_trigger),
        };

        // Sanitizing may have hollowed out a field that was all cruft
        for (name, text) in cleaned.parts() {
            if text.is_empty() {
                return Err(ScriptError::Validation(format!(
                    "script field '{name}' is empty after sanitizing"
                )));
            }
        }

        Ok(cleaned)
    }
}

fn system_prompt(track: Track) -> String {
    let angle = match track {
        Track::Agro => {
            "You write punchy, provocative reaction scripts. Strong opinions, short sentences."
        }
        Track::Info => {
            "You write clear explainer scripts. Make one complex thing simple and concrete."
        }
    };
    format!(
        "{angle} Respond with a single JSON object with exactly these string keys: \
         \"hook\", \"core_summary\", \"controversy_point\", \"comment_trigger\". \
         No markdown, no extra keys, no commentary. Never mention websites, \
         publications, or links."
    )
}

fn user_prompt(item: &SourceItem, quality_score: f64) -> String {
    let excerpt: String = item.body.chars().take(BODY_PROMPT_CHARS).collect();
    let persona_line = match &item.persona {
        Some(persona) => format!("Write in the voice of: {persona}\n"),
        None => String::new(),
    };
    format!(
        "{persona_line}Audience interest score: {quality_score:.1}/10\n\
         Title: {}\n\nArticle:\n{excerpt}",
        item.title
    )
}
