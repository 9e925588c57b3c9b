//! Core embedder trait and error types.

use crate::normalize::cosine_similarity;
use medkg_core::Retryable;
use thiserror::Error;
use tracing::warn;

/// Embedding error types.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Rate limited (HTTP 429): {0}")]
    RateLimited(String),

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Authentication failed (HTTP {0})")]
    AuthenticationFailed(u16),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        !matches!(
            self,
            EmbeddingError::AuthenticationFailed(_) | EmbeddingError::InvalidInput(_)
        )
    }
}

/// Result type for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Core trait for embedding providers.
///
/// Implementors convert text to dense vectors. Implementations are shared
/// across concurrent retrievals, so they take `&self` and hold no per-call state.
pub trait Embedder: Send + Sync {
    /// Embed a single text string.
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Get the model name/identifier.
    fn model_name(&self) -> &str;

    /// Embed, degrading to an empty vector on failure.
    ///
    /// An empty vector scores `0.0` against anything, so callers keep going
    /// with reduced ranking quality instead of aborting.
    fn embed_or_empty(&self, text: &str) -> Vec<f32> {
        match self.embed(text) {
            Ok(vector) => vector,
            Err(e) => {
                warn!(model = self.model_name(), text, "Embedding failed: {}", e);
                Vec::new()
            }
        }
    }

    /// Cosine similarity between two vectors.
    fn similarity(&self, a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(a, b)
    }
}
