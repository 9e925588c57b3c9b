//! # medkg LLM
//!
//! Completion backends and prompt templates.
//!
//! The pipeline issues two kinds of completions: a low-temperature call that
//! extracts entities and relations from a question, and the final answer call.
//! Both go through an [`LlmBackend`].
//!
//! ## Features
//!
//! - `api` (default): [`ChatBackend`], an OpenAI-compatible `/chat/completions` client
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medkg_llm::{ChatBackend, LlmBackend, LlmConfig};
//!
//! let backend = ChatBackend::new(base_url, api_key, LlmConfig::default().with_model("qwen-plus"))?;
//! let text = backend.complete("肺炎有什么症状？")?;
//! ```

mod backend;
mod prompt;

pub use backend::{LlmBackend, LlmConfig, LlmError, LlmResult, MockBackend};
pub use prompt::{strip_code_fence, AnswerContext, AnswerPrompt, ExtractionPrompt, PromptTemplate};

#[cfg(feature = "api")]
mod chat;
#[cfg(feature = "api")]
pub use chat::ChatBackend;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{LlmBackend, LlmConfig, LlmError, LlmResult, MockBackend};
    pub use crate::{AnswerContext, AnswerPrompt, ExtractionPrompt, PromptTemplate};

    #[cfg(feature = "api")]
    pub use crate::ChatBackend;
}
