use serde::{Deserialize, Serialize};

use super::ScriptError;

/// The four narrative beats of a short.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShortScript {
    pub hook: String,
    pub core_summary: String,
    pub controversy_point: String,
    pub comment_trigger: String,
}

impl ShortScript {
    /// The beats in playback order.
    pub fn parts(&self) -> [(&'static str, &str); 4] {
        [
            ("hook", &self.hook),
            ("core_summary", &self.core_summary),
            ("controversy_point", &self.controversy_point),
            ("comment_trigger", &self.comment_trigger),
        ]
    }

    fn validate(&self) -> Result<(), ScriptError> {
        for (name, text) in self.parts() {
            if text.trim().is_empty() {
                return Err(ScriptError::Validation(format!(
                    "script field '{name}' is empty"
                )));
            }
        }
        Ok(())
    }
}

/// Strip markdown code fences models like to wrap JSON in.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Parse and validate a raw model response into a script.
///
/// A structurally broken or incomplete response is a fatal validation
/// failure; the caller must not retry.
pub fn parse_script(raw: &str) -> Result<ShortScript, ScriptError> {
    let json = strip_code_fences(raw);
    let script: ShortScript = serde_json::from_str(json)
        .map_err(|e| ScriptError::Validation(format!("script is not valid JSON: {e}")))?;
    script.validate()?;
    Ok(script)
}
