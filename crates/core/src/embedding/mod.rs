//! Text embedding service used for near-duplicate detection.

mod remote;
mod similarity;

pub use remote::*;
pub use similarity::*;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),
}

/// Turns text into a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
