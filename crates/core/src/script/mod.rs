//! Script stage: turn an article into a four-part short-form script.

mod generator;
mod llm;
mod sanitize;
mod types;

pub use generator::*;
pub use llm::*;
pub use sanitize::*;
pub use types::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Script model request failed: {0}")]
    Request(String),

    #[error("Invalid script model response: {0}")]
    InvalidResponse(String),

    #[error("Script validation failed: {0}")]
    Validation(String),
}
