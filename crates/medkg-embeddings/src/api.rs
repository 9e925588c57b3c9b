//! API-based embeddings over an OpenAI-compatible `/embeddings` endpoint.
//!
//! Requires the `api` feature.

use crate::{Embedder, EmbeddingError, EmbeddingResult};
use medkg_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for API-based embeddings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Service base URL; requests go to `{base_url}/embeddings`.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: "text-embedding-v4".to_string(),
            timeout_secs: 30,
        }
    }

    /// Set the model.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

/// Remote embedder with exponential backoff.
///
/// # Example
///
/// ```rust,ignore
/// use medkg_embeddings::{ApiConfig, ApiEmbedder, Embedder};
///
/// let config = ApiConfig::new("https://dashscope.aliyuncs.com/compatible-mode/v1", "sk-...");
/// let embedder = ApiEmbedder::new(config)?;
/// let vector = embedder.embed_or_empty("肺炎");
/// ```
pub struct ApiEmbedder {
    config: ApiConfig,
    client: reqwest::blocking::Client,
    retry: RetryPolicy,
}

impl ApiEmbedder {
    /// Create a new API embedder with the given config.
    pub fn new(config: ApiConfig) -> EmbeddingResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            config,
            client,
            retry: RetryPolicy::exponential(),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// One request, no retries.
    fn request(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input: text,
        };

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout(e.to_string())
                } else {
                    EmbeddingError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().unwrap_or_default();
            return Err(match status {
                429 => EmbeddingError::RateLimited(body),
                401 | 403 => EmbeddingError::AuthenticationFailed(status),
                _ => EmbeddingError::Status { status, body },
            });
        }

        let resp: EmbeddingResponse = response
            .json()
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        resp.data
            .into_iter()
            .next()
            .and_then(|d| d.embedding)
            .ok_or_else(|| {
                EmbeddingError::InvalidResponse("missing data[0].embedding".to_string())
            })
    }
}

impl Embedder for ApiEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("Empty text".to_string()));
        }

        let vector = self.retry.execute("embedding", |_| self.request(text))?;
        debug!(model = %self.config.model, dimension = vector.len(), "Embedded text");
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
