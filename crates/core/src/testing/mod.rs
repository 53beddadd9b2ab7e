//! Testing utilities and mock implementations.
//!
//! Mock implementations of every external service trait, so the pipeline can
//! be exercised end to end without real infrastructure. All mocks are
//! configured through plain synchronous methods and are safe to share
//! between tasks.

mod mock_delivery;
mod mock_embedder;
mod mock_image_provider;
mod mock_renderer;
mod mock_script_model;
mod mock_speech;

pub use mock_delivery::MockDeliveryApi;
pub use mock_embedder::MockEmbedder;
pub use mock_image_provider::MockImageProvider;
pub use mock_renderer::MockRenderer;
pub use mock_script_model::MockScriptModel;
pub use mock_speech::MockSpeechService;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::repository::SourceItem;
    use chrono::Utc;

    /// A source article with reasonable defaults.
    pub fn article(id: i64, title: &str, popularity: i64) -> SourceItem {
        SourceItem {
            id,
            title: title.to_string(),
            body: "word ".repeat(150),
            popularity,
            reply_count: 10,
            persona: None,
            created_at: Utc::now(),
        }
    }

    /// A well-formed script model response.
    pub fn script_json() -> &'static str {
        r#"{
            "hook": "You will not believe this one.",
            "core_summary": "A small team shipped a feature everyone said was impossible.",
            "controversy_point": "Half the community thinks the numbers are made up.",
            "comment_trigger": "Whose side are you on?"
        }"#
    }
}
