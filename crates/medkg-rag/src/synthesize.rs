//! Answer synthesis from a retrieval result.
//!
//! The context is bounded twice: first to the top entities and triples as
//! JSON records, then, if the prompt is still longer than
//! [`PROMPT_CHAR_LIMIT`] characters, to a compact one-line form.

use medkg_core::{property_name, EntityProperty, RetrievalResult, Triple};
use medkg_llm::{AnswerContext, AnswerPrompt, LlmBackend, PromptTemplate};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Returned when the answer cannot be produced.
pub const APOLOGY: &str = "抱歉，我无法回答这个问题。";

/// Returned when retrieval found nothing to ground an answer in.
pub const INSUFFICIENT_INFORMATION: &str =
    "知识图谱中没有找到与该问题相关的信息，无法给出可靠的回答。";

/// Prompt length (in characters) above which the compact form is used.
pub const PROMPT_CHAR_LIMIT: usize = 8000;

/// Temperature used for answer completions.
pub const ANSWER_TEMPERATURE: f32 = 0.7;

const DETAILED_ENTITIES: usize = 10;
const DETAILED_TRIPLES: usize = 20;
const COMPACT_ENTITIES: usize = 5;
const COMPACT_TRIPLES: usize = 10;

const PROPERTY_WHITELIST: [&str; 4] = ["name", "description", "category", "type"];
const MAX_PROPERTY_CHARS: usize = 100;

#[derive(Debug, Serialize)]
struct EntitySummary<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    entity_type: &'a str,
    key_properties: BTreeMap<&'a str, &'a Value>,
}

#[derive(Debug, Serialize)]
struct TripleSummary<'a> {
    source: &'a str,
    relation: &'a str,
    target: &'a str,
    similarity: f64,
}

fn rendered_len(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}

fn summarize_entity(entity: &EntityProperty) -> EntitySummary<'_> {
    let key_properties = entity
        .properties
        .iter()
        .filter(|(key, value)| {
            PROPERTY_WHITELIST.contains(&key.as_str()) && rendered_len(value) < MAX_PROPERTY_CHARS
        })
        .map(|(key, value)| (key.as_str(), value))
        .collect();

    EntitySummary {
        name: &entity.name,
        entity_type: entity.entity_type.as_str(),
        key_properties,
    }
}

fn summarize_triple(triple: &Triple) -> TripleSummary<'_> {
    TripleSummary {
        source: property_name(&triple.source),
        relation: &triple.relation,
        target: property_name(&triple.target),
        similarity: (f64::from(triple.similarity) * 100.0).round() / 100.0,
    }
}

/// Detailed form: pretty-printed records for the top entities and triples.
fn detailed_context(result: &RetrievalResult) -> serde_json::Result<AnswerContext> {
    let entities: Vec<EntitySummary> = result
        .entity_properties
        .iter()
        .take(DETAILED_ENTITIES)
        .map(summarize_entity)
        .collect();
    let triples: Vec<TripleSummary> = result
        .related_triples
        .iter()
        .take(DETAILED_TRIPLES)
        .map(summarize_triple)
        .collect();

    Ok(AnswerContext::Detailed {
        entities_json: serde_json::to_string_pretty(&entities)?,
        entity_count: entities.len(),
        triples_json: serde_json::to_string_pretty(&triples)?,
        triple_count: triples.len(),
    })
}

/// Compact form: `name(type)` and `source-relation-target`, joined by `"; "`.
fn compact_context(result: &RetrievalResult) -> AnswerContext {
    let entities = result
        .entity_properties
        .iter()
        .take(COMPACT_ENTITIES)
        .map(|e| format!("{}({})", e.name, e.entity_type))
        .collect::<Vec<_>>()
        .join("; ");
    let triples = result
        .related_triples
        .iter()
        .take(COMPACT_TRIPLES)
        .map(|t| format!("{}-{}-{}", t.source_name(), t.relation, t.target_name()))
        .collect::<Vec<_>>()
        .join("; ");

    AnswerContext::Compact { entities, triples }
}

/// Builds the answer prompt and calls the completion backend.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmBackend>,
    temperature: f32,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self {
            llm,
            temperature: ANSWER_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// The prompt that [`synthesize`](Self::synthesize) would send.
    pub fn build_prompt(
        &self,
        question: &str,
        result: &RetrievalResult,
    ) -> serde_json::Result<AnswerPrompt> {
        let detailed = AnswerPrompt::new(question, detailed_context(result)?);
        let length = detailed.generate().chars().count();
        debug!(prompt_chars = length, "Built detailed answer prompt");

        if length <= PROMPT_CHAR_LIMIT {
            return Ok(detailed);
        }

        let compact = AnswerPrompt::new(question, compact_context(result));
        info!(
            prompt_chars = length,
            compact_chars = compact.generate().chars().count(),
            "Prompt over {} characters, using compact context",
            PROMPT_CHAR_LIMIT
        );
        Ok(compact)
    }

    /// Answer the question from the retrieved facts.
    ///
    /// Never fails: an empty result yields [`INSUFFICIENT_INFORMATION`] without
    /// calling the model, and any error yields [`APOLOGY`].
    pub fn synthesize(&self, question: &str, result: &RetrievalResult) -> String {
        if result.is_empty() {
            info!("No facts retrieved; skipping the answer completion");
            return INSUFFICIENT_INFORMATION.to_string();
        }

        let prompt = match self.build_prompt(question, result) {
            Ok(prompt) => prompt.generate(),
            Err(e) => {
                warn!("Failed to render answer context: {}", e);
                return APOLOGY.to_string();
            }
        };

        match self.llm.complete_with_temperature(&prompt, self.temperature) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(backend = self.llm.name(), "Answer completion failed: {}", e);
                APOLOGY.to_string()
            }
        }
    }
}
