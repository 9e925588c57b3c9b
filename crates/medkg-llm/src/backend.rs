//! Core LLM backend trait.

use medkg_core::Retryable;
use std::sync::Mutex;
use thiserror::Error;

/// LLM-related errors.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Rate limited (HTTP 429): {0}")]
    RateLimited(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed (HTTP {0})")]
    AuthenticationFailed(u16),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl Retryable for LlmError {
    fn is_retryable(&self) -> bool {
        !matches!(self, LlmError::AuthenticationFailed(_))
    }
}

/// Result type for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Configuration for LLM requests.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model name/identifier.
    pub model: String,
    /// Temperature used by [`LlmBackend::complete`].
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "qwen-plus".to_string(),
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Core trait for completion backends.
///
/// Calls block the current thread; retries happen inside the call.
pub trait LlmBackend: Send + Sync {
    /// Get the backend name.
    fn name(&self) -> &str;

    /// Get the current configuration.
    fn config(&self) -> &LlmConfig;

    /// Generate a completion at an explicit temperature.
    fn complete_with_temperature(&self, prompt: &str, temperature: f32) -> LlmResult<String>;

    /// Generate a completion at the configured temperature.
    fn complete(&self, prompt: &str) -> LlmResult<String> {
        self.complete_with_temperature(prompt, self.config().temperature)
    }
}

/// A mock backend for testing.
///
/// Answers with the first canned response whose pattern occurs in the prompt
/// and records every prompt it receives.
pub struct MockBackend {
    config: LlmConfig,
    responses: Vec<(String, String)>,
    default_response: String,
    fail: bool,
    calls: Mutex<Vec<(String, f32)>>,
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self {
            config: LlmConfig::default().with_model("mock"),
            responses: Vec::new(),
            default_response: "Mock response".to_string(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A backend whose every call fails after exhausting retries.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Add a canned response for a prompt pattern.
    pub fn with_response(mut self, pattern: &str, response: &str) -> Self {
        self.responses.push((pattern.to_string(), response.to_string()));
        self
    }

    /// Response used when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = response.to_string();
        self
    }

    /// Prompts received so far with their temperatures.
    pub fn calls(&self) -> Vec<(String, f32)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn complete_with_temperature(&self, prompt: &str, temperature: f32) -> LlmResult<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((prompt.to_string(), temperature));
        }

        if self.fail {
            return Err(LlmError::RateLimited("mock backend is failing".to_string()));
        }

        for (pattern, response) in &self.responses {
            if prompt.contains(pattern.as_str()) {
                return Ok(response.clone());
            }
        }
        Ok(self.default_response.clone())
    }
}
