//! Configuration management for the medkg CLI.
//!
//! Settings come from `medkg.toml` (found in the current or a parent
//! directory), then environment variables, then command-line flags.

use anyhow::{Context, Result};
use medkg_core::error::require;
use medkg_core::{BudgetProfile, ConfigError, ConfigResult, RetryPolicy};
use medkg_rag::RetrievalOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "medkg.toml";

/// Upper bound for `retry.base_delay_secs`.
pub const MAX_BASE_DELAY_SECS: f64 = 60.0;

/// medkg configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub embedding: EmbeddingSection,
    #[serde(default)]
    pub graph: GraphSection,
    #[serde(default)]
    pub retrieval: RetrievalSection,
    #[serde(default)]
    pub retry: RetrySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_extraction_temperature")]
    pub extraction_temperature: f32,
    #[serde(default = "default_answer_temperature")]
    pub answer_temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

/// Blank `base_url`/`api_key` reuse the `[llm]` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSection {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSection {
    #[serde(default = "default_graph_uri")]
    pub uri: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_graph_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalSection {
    #[serde(default = "default_budget")]
    pub budget: String,
    #[serde(default = "default_true")]
    pub enable_multi_hop: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: f64,
}

// Default value functions
fn default_model() -> String { "qwen-plus".to_string() }
fn default_extraction_temperature() -> f32 { 0.2 }
fn default_answer_temperature() -> f32 { 0.7 }
fn default_llm_timeout() -> u64 { 60 }
fn default_embedding_model() -> String { "text-embedding-v4".to_string() }
fn default_embedding_timeout() -> u64 { 30 }
fn default_graph_uri() -> String { "http://localhost:7474".to_string() }
fn default_database() -> String { "neo4j".to_string() }
fn default_graph_user() -> String { "neo4j".to_string() }
fn default_budget() -> String { BudgetProfile::DEEPER.to_string() }
fn default_true() -> bool { true }
fn default_max_attempts() -> u32 { 3 }
fn default_base_delay() -> f64 { 1.0 }

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            model: default_model(),
            extraction_temperature: default_extraction_temperature(),
            answer_temperature: default_answer_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            model: default_embedding_model(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            uri: default_graph_uri(),
            database: default_database(),
            user: default_graph_user(),
            password: String::new(),
        }
    }
}

impl Default for RetrievalSection {
    fn default() -> Self {
        Self {
            budget: default_budget(),
            enable_multi_hop: default_true(),
        }
    }
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay(),
        }
    }
}

/// Command-line overrides applied on top of file and environment settings.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub budget: Option<String>,
    pub disable_multi_hop: bool,
}

impl Config {
    /// Load `path`, or the discovered `medkg.toml`, or defaults; then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let found = match path {
            Some(path) => Some(path.to_path_buf()),
            None => std::env::current_dir()
                .ok()
                .and_then(|dir| find_config_file(&dir)),
        };

        let mut config = match found {
            Some(path) => Self::from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Override settings from environment variables read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets: [(&str, &mut String); 7] = [
            ("MEDKG_API_KEY", &mut self.llm.api_key),
            ("MEDKG_BASE_URL", &mut self.llm.base_url),
            ("MEDKG_MODEL", &mut self.llm.model),
            ("MEDKG_EMBEDDING_MODEL", &mut self.embedding.model),
            ("NEO4J_URI", &mut self.graph.uri),
            ("NEO4J_USER", &mut self.graph.user),
            ("NEO4J_PASSWORD", &mut self.graph.password),
        ];
        for (key, field) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *field = value;
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(budget) = &overrides.budget {
            self.retrieval.budget = budget.clone();
        }
        if overrides.disable_multi_hop {
            self.retrieval.enable_multi_hop = false;
        }
    }

    /// Reject missing credentials and unusable values.
    pub fn validate(&self) -> ConfigResult<()> {
        require("llm.base_url", Some(self.llm.base_url.as_str()))?;
        require("llm.api_key", Some(self.llm.api_key.as_str()))?;
        require("graph.uri", Some(self.graph.uri.as_str()))?;
        require("graph.password", Some(self.graph.password.as_str()))?;

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "retry.max_attempts",
                "0",
                "at least one attempt is required",
            ));
        }
        let delay = self.retry.base_delay_secs;
        if !(0.0..=MAX_BASE_DELAY_SECS).contains(&delay) {
            return Err(ConfigError::invalid(
                "retry.base_delay_secs",
                delay.to_string(),
                format!("must be between 0 and {} seconds", MAX_BASE_DELAY_SECS),
            ));
        }

        self.retrieval_options().budget.validate()
    }

    pub fn embedding_base_url(&self) -> &str {
        if self.embedding.base_url.trim().is_empty() {
            &self.llm.base_url
        } else {
            &self.embedding.base_url
        }
    }

    pub fn embedding_api_key(&self) -> &str {
        if self.embedding.api_key.trim().is_empty() {
            &self.llm.api_key
        } else {
            &self.embedding.api_key
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::try_from_secs_f64(self.retry.base_delay_secs)
                .unwrap_or_else(|_| Duration::from_secs_f64(default_base_delay())),
        )
    }

    pub fn retrieval_options(&self) -> RetrievalOptions {
        RetrievalOptions::with_budget_name(&self.retrieval.budget)
            .with_multi_hop(self.retrieval.enable_multi_hop)
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, Self::to_toml(self)?)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

/// Find `medkg.toml` in `start` or its parent directories.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.is_file() {
            return Some(config_path);
        }
        if !dir.pop() {
            return None;
        }
    }
}
