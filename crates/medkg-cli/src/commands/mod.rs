//! CLI command implementations.

pub mod ask;
pub mod chat;
pub mod init;
pub mod render;

use anyhow::{Context, Result};
use colored::Colorize;
use medkg_embeddings::{ApiConfig, ApiEmbedder};
use medkg_graph::{GraphStore, Neo4jConfig, Neo4jHttpStore};
use medkg_llm::{ChatBackend, LlmConfig};
use medkg_rag::QaPipeline;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;

/// Build the pipeline from a validated config and check that the graph is reachable.
pub fn connect(config: &Config) -> Result<Arc<QaPipeline>> {
    config.validate().context("Invalid configuration")?;
    let retry = config.retry_policy();

    let llm_config = LlmConfig::default()
        .with_model(config.llm.model.as_str())
        .with_timeout(config.llm.timeout_secs);
    let llm = ChatBackend::new(&config.llm.base_url, &config.llm.api_key, llm_config)
        .context("Failed to create completion client")?
        .with_retry_policy(retry.clone());

    let embedder = ApiEmbedder::new(
        ApiConfig::new(config.embedding_base_url(), config.embedding_api_key())
            .with_model(&config.embedding.model)
            .with_timeout(config.embedding.timeout_secs),
    )
    .context("Failed to create embedding client")?
    .with_retry_policy(retry);

    let store = Neo4jHttpStore::new(
        Neo4jConfig::new(&config.graph.uri, &config.graph.user, &config.graph.password)
            .with_database(&config.graph.database),
    )
    .context("Failed to create graph client")?;
    store.health_check().with_context(|| {
        format!(
            "Cannot reach the knowledge graph at {}",
            config.graph.uri.as_str().cyan()
        )
    })?;
    info!(uri = %config.graph.uri, "Knowledge graph reachable");

    let pipeline = QaPipeline::new(Arc::new(llm), Arc::new(store), Arc::new(embedder))
        .with_options(config.retrieval_options())
        .with_temperatures(
            config.llm.extraction_temperature,
            config.llm.answer_temperature,
        );
    Ok(Arc::new(pipeline))
}
