//! Entity/relation extraction from a question.
//!
//! One low-temperature completion returns a JSON object with `entities` and
//! `relations`. Models answer in a few different shapes, so records are
//! normalised before use and anything unusable is dropped.

use medkg_core::{Entity, EntityType, Extraction, Relation, RelationType};
use medkg_llm::{strip_code_fence, ExtractionPrompt, LlmBackend, PromptTemplate};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Temperature used for extraction completions.
pub const EXTRACTION_TEMPERATURE: f32 = 0.2;

/// Entity shapes seen in model output.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntity {
    Named {
        name: String,
        #[serde(rename = "type")]
        entity_type: String,
    },
    /// `{text, type}` and `{id, text, type}`.
    Text {
        text: String,
        #[serde(rename = "type")]
        entity_type: String,
    },
    Unrecognized(Value),
}

impl RawEntity {
    fn normalize(self) -> Entity {
        match self {
            RawEntity::Named { name, entity_type } | RawEntity::Text { text: name, entity_type } => {
                Entity::new(name, EntityType::parse(&entity_type))
            }
            RawEntity::Unrecognized(value) => {
                debug!(%value, "Unrecognized entity shape");
                Entity::new("", EntityType::Other)
            }
        }
    }
}

/// Relation shapes seen in model output.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRelation {
    Standard {
        source: String,
        target: String,
        #[serde(rename = "type")]
        relation_type: String,
    },
    HeadTail {
        head: String,
        tail: String,
        #[serde(rename = "type")]
        relation_type: String,
    },
    Unrecognized(Value),
}

impl RawRelation {
    fn normalize(self) -> Relation {
        match self {
            RawRelation::Standard {
                source,
                target,
                relation_type,
            }
            | RawRelation::HeadTail {
                head: source,
                tail: target,
                relation_type,
            } => Relation::new(source, target, RelationType::parse(&relation_type)),
            RawRelation::Unrecognized(value) => {
                debug!(%value, "Unrecognized relation shape");
                Relation::new("", "", RelationType::default())
            }
        }
    }
}

/// Parse a completion into an [`Extraction`].
///
/// Invalid JSON, or an object missing either key, yields an empty extraction.
/// Records that normalise to blank names are dropped.
pub fn parse_extraction(response: &str) -> Extraction {
    let body = strip_code_fence(response);

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!("Extraction response is not valid JSON: {}", e);
            return Extraction::empty();
        }
    };

    let (Some(entities), Some(relations)) = (value.get("entities"), value.get("relations")) else {
        warn!("Extraction response lacks `entities` or `relations`");
        return Extraction::empty();
    };

    let entities = records::<RawEntity>(entities)
        .into_iter()
        .map(RawEntity::normalize)
        .filter(|e| !e.is_empty())
        .collect();
    let relations = records::<RawRelation>(relations)
        .into_iter()
        .map(RawRelation::normalize)
        .filter(|r| !r.is_empty())
        .collect();

    Extraction {
        entities,
        relations,
    }
}

/// Deserialize each element of a JSON array independently.
fn records<T: for<'de> Deserialize<'de>>(value: &Value) -> Vec<T> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Turns a question into candidate entities and relations.
pub struct EntityExtractor {
    llm: Arc<dyn LlmBackend>,
    temperature: f32,
}

impl EntityExtractor {
    pub fn new(llm: Arc<dyn LlmBackend>) -> Self {
        Self {
            llm,
            temperature: EXTRACTION_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Extract entities and relations. Never fails: completion errors and
    /// unusable responses both produce an empty extraction.
    pub fn extract(&self, question: &str) -> Extraction {
        let prompt = ExtractionPrompt::new(question).generate();

        let response = match self.llm.complete_with_temperature(&prompt, self.temperature) {
            Ok(response) => response,
            Err(e) => {
                warn!(backend = self.llm.name(), "Entity extraction failed: {}", e);
                return Extraction::empty();
            }
        };

        let extraction = parse_extraction(&response);
        debug!(
            entities = extraction.entities.len(),
            relations = extraction.relations.len(),
            "Extracted question structure"
        );
        extraction
    }
}
