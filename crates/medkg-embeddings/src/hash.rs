//! Deterministic hash-based embedder (no network, no model).
//!
//! Hashes character unigrams and bigrams into a fixed-dimension space, so
//! Chinese text without word boundaries still shares features. Useful as an
//! offline stand-in for the remote embedder.

use crate::normalize::normalize_l2;
use crate::{Embedder, EmbeddingError, EmbeddingResult};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Hash-based embedder.
///
/// # Example
///
/// ```rust
/// use medkg_embeddings::{Embedder, HashEmbedder};
///
/// let embedder = HashEmbedder::new(128);
/// let vec = embedder.embed("糖尿病").unwrap();
/// assert_eq!(vec.len(), 128);
/// ```
pub struct HashEmbedder {
    dimension: usize,
    num_hashes: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            num_hashes: 4,
        }
    }

    /// Word tokens for ASCII runs, character unigrams and bigrams otherwise.
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let lowered = text.to_lowercase();
        for run in lowered.split(|c: char| !c.is_alphanumeric()) {
            if run.is_empty() {
                continue;
            }
            if run.is_ascii() {
                if run.len() > 1 {
                    tokens.push(run.to_string());
                }
                continue;
            }
            let chars: Vec<char> = run.chars().collect();
            for c in &chars {
                tokens.push(c.to_string());
            }
            for pair in chars.windows(2) {
                tokens.push(pair.iter().collect());
            }
        }
        tokens
    }

    fn hash_with_seed(&self, token: &str, seed: u64) -> u64 {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        token.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        let mut vector = vec![0.0f32; self.dimension];
        for token in self.tokenize(text) {
            for seed in 0..self.num_hashes as u64 {
                let idx = (self.hash_with_seed(&token, seed) % self.dimension as u64) as usize;
                let sign = if self.hash_with_seed(&token, seed + 1000) % 2 == 0 {
                    1.0
                } else {
                    -1.0
                };
                vector[idx] += sign;
            }
        }

        normalize_l2(&mut vector);
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosine_similarity;

    #[test]
    fn same_text_same_vector() {
        let embedder = HashEmbedder::new(128);
        let v1 = embedder.embed("肺炎 HAS_SYMPTOM").unwrap();
        let v2 = embedder.embed("肺炎 HAS_SYMPTOM").unwrap();
        assert_eq!(v1, v2);
        assert_eq!(cosine_similarity(&v1, &v2), 1.0);
    }

    #[test]
    fn shared_characters_score_higher() {
        let embedder = HashEmbedder::new(256);
        let question = embedder.embed("肺炎 HAS_SYMPTOM").unwrap();
        let related = embedder.embed("肺炎").unwrap();
        let unrelated = embedder.embed("鸡蛋").unwrap();

        assert!(
            cosine_similarity(&question, &related) > cosine_similarity(&question, &unrelated)
        );
    }

    #[test]
    fn blank_text_is_rejected() {
        let embedder = HashEmbedder::default();
        assert!(embedder.embed("  ").is_err());
        assert!(embedder.embed_or_empty("").is_empty());
    }
}
