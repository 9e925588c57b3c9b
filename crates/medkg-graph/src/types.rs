//! Canonical node and edge records.
//!
//! Store records are untyped (a label list plus a property map). They are
//! validated into these types at the boundary so the engine never sees a
//! node outside the medical domain.

use medkg_core::{property_name, EntityType, PropertyMap, RelationType};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GraphError, GraphResult};

/// The nine node labels of the medical graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    Disease,
    Category,
    Symptom,
    Department,
    Treatment,
    Check,
    Drug,
    Food,
    Recipe,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 9] = [
        NodeLabel::Disease,
        NodeLabel::Category,
        NodeLabel::Symptom,
        NodeLabel::Department,
        NodeLabel::Treatment,
        NodeLabel::Check,
        NodeLabel::Drug,
        NodeLabel::Food,
        NodeLabel::Recipe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Disease => "Disease",
            NodeLabel::Category => "Category",
            NodeLabel::Symptom => "Symptom",
            NodeLabel::Department => "Department",
            NodeLabel::Treatment => "Treatment",
            NodeLabel::Check => "Check",
            NodeLabel::Drug => "Drug",
            NodeLabel::Food => "Food",
            NodeLabel::Recipe => "Recipe",
        }
    }

    /// Exact, case-sensitive match against a store label.
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.as_str() == label)
    }

    /// First domain label in a node's label list.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Option<Self> {
        labels.iter().find_map(|l| Self::parse(l.as_ref()))
    }

    pub fn entity_type(&self) -> EntityType {
        EntityType::parse(self.as_str())
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which labels an entity lookup may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelScope {
    /// `Disease` nodes only.
    Disease,
    /// Any of the nine domain labels.
    Domain,
}

impl LabelScope {
    pub fn for_entity(entity_type: EntityType) -> Self {
        if entity_type == EntityType::Disease {
            LabelScope::Disease
        } else {
            LabelScope::Domain
        }
    }

    pub fn matches(&self, label: NodeLabel) -> bool {
        match self {
            LabelScope::Disease => label == NodeLabel::Disease,
            LabelScope::Domain => true,
        }
    }
}

/// Edge direction relative to the anchor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `(anchor)-[r]->(neighbor)`
    Outgoing,
    /// `(anchor)<-[r]-(neighbor)`
    Incoming,
}

/// A validated graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub label: NodeLabel,
    pub properties: PropertyMap,
}

impl GraphNode {
    pub fn new(label: NodeLabel, properties: PropertyMap) -> Self {
        Self { label, properties }
    }

    /// Node with only a `name` property.
    pub fn named(label: NodeLabel, name: &str) -> Self {
        let mut properties = PropertyMap::new();
        properties.insert("name".to_string(), serde_json::Value::from(name));
        Self { label, properties }
    }

    /// Validate a raw record.
    pub fn from_record<S: AsRef<str>>(labels: &[S], properties: PropertyMap) -> GraphResult<Self> {
        let label = NodeLabel::from_labels(labels).ok_or_else(|| {
            let names: Vec<&str> = labels.iter().map(|l| l.as_ref()).collect();
            GraphError::MalformedRecord(format!("no domain label in {:?}", names))
        })?;
        Ok(Self { label, properties })
    }

    pub fn name(&self) -> &str {
        property_name(&self.properties)
    }
}

/// A directed, typed edge between two domain nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: GraphNode,
    pub relation: RelationType,
    pub target: GraphNode,
}

impl GraphEdge {
    pub fn new(source: GraphNode, relation: RelationType, target: GraphNode) -> Self {
        Self {
            source,
            relation,
            target,
        }
    }

    /// The endpoint that is not the anchor of a directional lookup.
    pub fn neighbor(&self, direction: Direction) -> &GraphNode {
        match direction {
            Direction::Outgoing => &self.target,
            Direction::Incoming => &self.source,
        }
    }
}

/// Append `extra` to `edges`, skipping rows already present (Cypher `UNION`).
pub fn union_edges(mut edges: Vec<GraphEdge>, extra: Vec<GraphEdge>) -> Vec<GraphEdge> {
    for edge in extra {
        if !edges.contains(&edge) {
            edges.push(edge);
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing_is_exact() {
        assert_eq!(NodeLabel::parse("Drug"), Some(NodeLabel::Drug));
        assert_eq!(NodeLabel::parse("drug"), None);
        assert_eq!(NodeLabel::parse("Person"), None);
        assert_eq!(
            NodeLabel::from_labels(&["Imported", "Symptom"]),
            Some(NodeLabel::Symptom)
        );
        assert_eq!(NodeLabel::Check.entity_type(), EntityType::Check);
    }

    #[test]
    fn test_scope_for_entity() {
        assert_eq!(LabelScope::for_entity(EntityType::Disease), LabelScope::Disease);
        assert_eq!(LabelScope::for_entity(EntityType::Other), LabelScope::Domain);
        assert!(!LabelScope::Disease.matches(NodeLabel::Symptom));
        assert!(LabelScope::Domain.matches(NodeLabel::Recipe));
    }

    #[test]
    fn test_record_without_domain_label_is_rejected() {
        let err = GraphNode::from_record(&["Person"], PropertyMap::new()).unwrap_err();
        assert!(matches!(err, GraphError::MalformedRecord(_)));
    }

    #[test]
    fn test_union_skips_duplicates() {
        let edge = GraphEdge::new(
            GraphNode::named(NodeLabel::Disease, "肺炎"),
            RelationType::HasSymptom,
            GraphNode::named(NodeLabel::Symptom, "发热"),
        );
        let other = GraphEdge::new(
            GraphNode::named(NodeLabel::Disease, "肺炎"),
            RelationType::HasSymptom,
            GraphNode::named(NodeLabel::Symptom, "咳嗽"),
        );

        let merged = union_edges(vec![edge.clone()], vec![edge.clone(), other.clone()]);
        assert_eq!(merged, vec![edge.clone(), other]);
        assert_eq!(merged[0].neighbor(Direction::Outgoing).name(), "发热");
        assert_eq!(merged[0].neighbor(Direction::Incoming).name(), "肺炎");
    }
}
