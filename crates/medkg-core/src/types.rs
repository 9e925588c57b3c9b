//! Shared types used across the extraction, retrieval and synthesis stages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute mapping of a graph node, exactly as returned by the store.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Type of an entity extracted from a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Disease,
    Category,
    Symptom,
    Department,
    Treatment,
    Check,
    Drug,
    Food,
    Recipe,
    Person,
    Organization,
    Time,
    Location,
    /// Anything the extractor could not classify.
    Other,
}

impl EntityType {
    pub const ALL: [EntityType; 14] = [
        EntityType::Disease,
        EntityType::Category,
        EntityType::Symptom,
        EntityType::Department,
        EntityType::Treatment,
        EntityType::Check,
        EntityType::Drug,
        EntityType::Food,
        EntityType::Recipe,
        EntityType::Person,
        EntityType::Organization,
        EntityType::Time,
        EntityType::Location,
        EntityType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Disease => "Disease",
            EntityType::Category => "Category",
            EntityType::Symptom => "Symptom",
            EntityType::Department => "Department",
            EntityType::Treatment => "Treatment",
            EntityType::Check => "Check",
            EntityType::Drug => "Drug",
            EntityType::Food => "Food",
            EntityType::Recipe => "Recipe",
            EntityType::Person => "Person",
            EntityType::Organization => "Organization",
            EntityType::Time => "Time",
            EntityType::Location => "Location",
            EntityType::Other => "Other",
        }
    }

    /// Parse a type name. Unknown names map to [`EntityType::Other`].
    pub fn parse(name: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(name.trim()))
            .unwrap_or(EntityType::Other)
    }
}

impl Default for EntityType {
    fn default() -> Self {
        Self::Other
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain predicate between two entities.
///
/// Serialized with the graph's edge-type names (`HAS_SYMPTOM`, ...). Names
/// outside the domain set are kept verbatim in [`RelationType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationType {
    /// Disease belongs to a category.
    BelongsTo,
    /// Disease has a symptom.
    HasSymptom,
    /// Disease is treated by a department.
    TreatedBy,
    /// Disease uses a treatment.
    UsesTreatment,
    /// Disease requires a check.
    RequiresCheck,
    /// Disease recommends a drug.
    RecommendsDrug,
    /// Disease commonly uses a drug.
    CommonlyUsesDrug,
    /// Patients should eat a food.
    ShouldEat,
    /// Patients should not eat a food.
    ShouldNotEat,
    /// Disease recommends a recipe.
    RecommendsRecipe,
    /// Disease accompanies another disease.
    Accompanies,
    /// Any other predicate, holding its edge-type name.
    Other(String),
}

impl RelationType {
    /// Edge-type name used for an unnamed [`RelationType::Other`].
    pub const OTHER: &'static str = "OTHER";

    /// The domain predicates, without the `Other` fallback.
    pub const KNOWN: [RelationType; 11] = [
        RelationType::BelongsTo,
        RelationType::HasSymptom,
        RelationType::TreatedBy,
        RelationType::UsesTreatment,
        RelationType::RequiresCheck,
        RelationType::RecommendsDrug,
        RelationType::CommonlyUsesDrug,
        RelationType::ShouldEat,
        RelationType::ShouldNotEat,
        RelationType::RecommendsRecipe,
        RelationType::Accompanies,
    ];

    /// Edge-type name as stored in the graph.
    pub fn as_str(&self) -> &str {
        match self {
            RelationType::BelongsTo => "BELONGS_TO",
            RelationType::HasSymptom => "HAS_SYMPTOM",
            RelationType::TreatedBy => "TREATED_BY",
            RelationType::UsesTreatment => "USES_TREATMENT",
            RelationType::RequiresCheck => "REQUIRES_CHECK",
            RelationType::RecommendsDrug => "RECOMMENDS_DRUG",
            RelationType::CommonlyUsesDrug => "COMMONLY_USES_DRUG",
            RelationType::ShouldEat => "SHOULD_EAT",
            RelationType::ShouldNotEat => "SHOULD_NOT_EAT",
            RelationType::RecommendsRecipe => "RECOMMENDS_RECIPE",
            RelationType::Accompanies => "ACCOMPANIES",
            RelationType::Other(name) => name,
        }
    }

    /// Parse an edge-type name.
    ///
    /// Unknown names become [`RelationType::Other`] carrying the trimmed name;
    /// a blank name becomes `Other("OTHER")`.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if let Some(known) = Self::KNOWN
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
        {
            return known.clone();
        }
        if name.is_empty() {
            RelationType::default()
        } else {
            RelationType::Other(name.to_string())
        }
    }

    pub fn is_other(&self) -> bool {
        matches!(self, RelationType::Other(_))
    }
}

impl Default for RelationType {
    fn default() -> Self {
        Self::Other(Self::OTHER.to_string())
    }
}

impl From<String> for RelationType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<RelationType> for String {
    fn from(relation: RelationType) -> String {
        relation.as_str().to_string()
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity mentioned in a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
}

impl Entity {
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
        }
    }

    /// Entities with blank names never reach a store query.
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// A relation extracted from a question, not yet resolved against the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
}

impl Relation {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation_type: RelationType,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation_type,
        }
    }

    /// A relation needs both endpoints to anchor a lookup.
    pub fn is_empty(&self) -> bool {
        self.source.trim().is_empty() || self.target.trim().is_empty()
    }
}

/// Attributes of an entity that matched a lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub properties: PropertyMap,
}

/// Marker for triples found by second-hop expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub struct SecondHop;

impl From<SecondHop> for u8 {
    fn from(_: SecondHop) -> u8 {
        2
    }
}

impl TryFrom<u8> for SecondHop {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(SecondHop),
            other => Err(format!("unsupported hop marker: {}", other)),
        }
    }
}

/// A retrieved fact with its relevance to the question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triple {
    pub source: PropertyMap,
    pub relation: String,
    pub target: PropertyMap,
    pub similarity: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hop: Option<SecondHop>,
}

impl Triple {
    pub fn source_name(&self) -> &str {
        property_name(&self.source)
    }

    pub fn target_name(&self) -> &str {
        property_name(&self.target)
    }

    pub fn is_second_hop(&self) -> bool {
        self.hop.is_some()
    }
}

/// The `name` property of a node, or `""` when absent or not a string.
pub fn property_name(properties: &PropertyMap) -> &str {
    properties
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("")
}

/// Final output of the graph query engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub entity_properties: Vec<EntityProperty>,
    /// Sorted by descending similarity.
    pub related_triples: Vec<Triple>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_properties.is_empty() && self.related_triples.is_empty()
    }

    pub fn second_hop_count(&self) -> usize {
        self.related_triples
            .iter()
            .filter(|t| t.is_second_hop())
            .count()
    }
}

/// Entities and relations extracted from one question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,
}

impl Extraction {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }
}
