//! # medkg Embeddings
//!
//! Turns text into vectors and scores vectors against each other.
//!
//! - [`ApiEmbedder`] calls a remote OpenAI-compatible `/embeddings` endpoint
//!   with exponential backoff
//! - [`HashEmbedder`] is a deterministic offline embedder for tests
//! - [`cosine_similarity`] is the scorer used by every ranking step
//!
//! ## Features
//!
//! - `api` (default): the HTTP embedder
//!
//! ## Usage
//!
//! ```rust
//! use medkg_embeddings::{cosine_similarity, Embedder, HashEmbedder};
//!
//! let embedder = HashEmbedder::new(64);
//! let v1 = embedder.embed_or_empty("肺炎 发热");
//! let v2 = embedder.embed_or_empty("肺炎 咳嗽");
//! assert!(cosine_similarity(&v1, &v2) > 0.0);
//! assert_eq!(cosine_similarity(&[], &v1), 0.0);
//! ```

mod embedder;
mod hash;
mod normalize;

pub use embedder::{Embedder, EmbeddingError, EmbeddingResult};
pub use hash::HashEmbedder;
pub use normalize::{cosine_similarity, normalize_l2};

#[cfg(feature = "api")]
mod api;
#[cfg(feature = "api")]
pub use api::{ApiConfig, ApiEmbedder};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{cosine_similarity, normalize_l2};
    pub use crate::{Embedder, EmbeddingError, EmbeddingResult, HashEmbedder};

    #[cfg(feature = "api")]
    pub use crate::{ApiConfig, ApiEmbedder};
}
