//! OpenAI-compatible chat completions backend.
//!
//! Requires the `api` feature. Works with any provider exposing
//! `POST {base}/chat/completions` (OpenAI, DashScope compatible mode, vLLM, ...).

use crate::backend::{LlmBackend, LlmConfig, LlmError, LlmResult};
use medkg_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions backend.
///
/// # Example
///
/// ```rust,ignore
/// use medkg_llm::{ChatBackend, LlmBackend, LlmConfig};
///
/// let backend = ChatBackend::new("https://api.openai.com/v1", "sk-...", LlmConfig::default())?;
/// let answer = backend.complete("...")?;
/// ```
pub struct ChatBackend {
    api_key: String,
    config: LlmConfig,
    client: reqwest::blocking::Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl ChatBackend {
    /// Create a backend for the given base URL.
    pub fn new(base_url: &str, api_key: &str, config: LlmConfig) -> LlmResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            api_key: api_key.to_string(),
            config,
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            retry: RetryPolicy::exponential(),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One request, no retries.
    fn request(&self, prompt: &str, temperature: f32) -> LlmResult<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(e.to_string())
                } else {
                    LlmError::ConnectionFailed(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().unwrap_or_default();
            return Err(match status {
                429 => LlmError::RateLimited(body),
                401 | 403 => LlmError::AuthenticationFailed(status),
                _ => LlmError::ApiError { status, body },
            });
        }

        let resp: ChatResponse = response
            .json()
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("missing choices[0].message.content".into()))
    }
}

impl LlmBackend for ChatBackend {
    fn name(&self) -> &str {
        "chat"
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn complete_with_temperature(&self, prompt: &str, temperature: f32) -> LlmResult<String> {
        let content = self
            .retry
            .execute("completion", |_| self.request(prompt, temperature))?;
        debug!(
            model = %self.config.model,
            prompt_chars = prompt.chars().count(),
            answer_chars = content.chars().count(),
            "Completion finished"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medkg_core::RecordingSleeper;
    use std::sync::Arc;

    fn backend(server: &mockito::Server) -> (ChatBackend, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::new());
        let backend = ChatBackend::new(
            &server.url(),
            "test-key",
            LlmConfig::default().with_model("test-model"),
        )
        .unwrap()
        .with_retry_policy(RetryPolicy::exponential().with_sleeper(sleeper.clone()));
        (backend, sleeper)
    }

    #[test]
    fn test_endpoint_from_base_url() {
        let backend =
            ChatBackend::new("https://example.com/v1/", "key", LlmConfig::default()).unwrap();
        assert_eq!(backend.endpoint(), "https://example.com/v1/chat/completions");
    }

    #[test]
    fn returns_first_choice_content() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "model": "test-model",
                "messages": [{"role": "user", "content": "肺炎有什么症状？"}],
                "temperature": 0.5
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"发热、咳嗽"}}]}"#)
            .create();

        let (backend, _) = backend(&server);
        let answer = backend
            .complete_with_temperature("肺炎有什么症状？", 0.5)
            .unwrap();

        assert_eq!(answer, "发热、咳嗽");
        mock.assert();
    }

    #[test]
    fn rate_limit_is_retried_then_succeeds() {
        let mut server = mockito::Server::new();
        let limited = server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .expect(1)
            .create();
        // mockito serves the first matching mock that still has expected hits left.
        let ok = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .expect(1)
            .create();

        let (backend, sleeper) = backend(&server);
        let answer = backend.complete("ping").unwrap();
        assert_eq!(answer, "ok");
        assert_eq!(sleeper.delays().len(), 1);
        limited.assert();
        ok.assert();
    }

    #[test]
    fn server_errors_fail_after_exhausting_retries() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("boom")
            .expect(3)
            .create();

        let (backend, sleeper) = backend(&server);
        let err = backend.complete("ping").unwrap_err();

        assert!(matches!(err, LlmError::ApiError { status: 500, .. }));
        assert_eq!(sleeper.delays().len(), 2);
        mock.assert();
    }
}
