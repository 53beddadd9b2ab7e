//! Mock embedder for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::embedding::{Embedder, EmbeddingError};

/// Mock implementation of the [`Embedder`] trait.
///
/// Unknown texts get a deterministic vector derived from their bytes, so two
/// identical texts always embed identically and two different texts almost
/// never collide.
#[derive(Default)]
pub struct MockEmbedder {
    embeddings: Mutex<HashMap<String, Vec<f32>>>,
    next_error: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the vector returned for an exact text.
    pub fn set_embedding(&self, text: &str, vector: Vec<f32>) {
        self.embeddings
            .lock()
            .unwrap()
            .insert(text.to_string(), vector);
    }

    /// Make the next `encode` call fail; consumed once.
    pub fn set_next_error(&self, message: &str) {
        *self.next_error.lock().unwrap() = Some(message.to_string());
    }

    /// Texts encoded so far, in order.
    pub fn encoded_texts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn default_vector(text: &str) -> Vec<f32> {
        let mut vector = [0.0f32; 8];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % 8] += f32::from(byte) / 255.0;
        }
        vector.to_vec()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(message) = self.next_error.lock().unwrap().take() {
            return Err(EmbeddingError::Request(message));
        }
        self.calls.lock().unwrap().push(text.to_string());

        let pinned = self.embeddings.lock().unwrap().get(text).cloned();
        Ok(pinned.unwrap_or_else(|| Self::default_vector(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pinned_embedding_wins() {
        let embedder = MockEmbedder::new();
        embedder.set_embedding("hello", vec![1.0, 0.0]);

        assert_eq!(embedder.encode("hello").await.unwrap(), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_default_vector_is_deterministic() {
        let embedder = MockEmbedder::new();
        let a = embedder.encode("some text").await.unwrap();
        let b = embedder.encode("some text").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, embedder.encode("other text").await.unwrap());
    }

    #[tokio::test]
    async fn test_error_is_consumed_once() {
        let embedder = MockEmbedder::new();
        embedder.set_next_error("down");

        assert!(embedder.encode("x").await.is_err());
        assert!(embedder.encode("x").await.is_ok());
        assert_eq!(embedder.encoded_texts(), vec!["x"]);
    }
}
