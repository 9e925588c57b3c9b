//! In-memory graph store backed by petgraph.
//!
//! Results come back in insertion order so traversals over a fixed graph are
//! deterministic.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction as PetDirection;
use std::collections::HashMap;

use crate::error::GraphResult;
use crate::store::GraphStore;
use crate::types::{union_edges, Direction, GraphEdge, GraphNode, LabelScope, NodeLabel};
use medkg_core::{PropertyMap, RelationType};

/// Petgraph-backed [`GraphStore`].
///
/// # Example
///
/// ```rust
/// use medkg_core::RelationType;
/// use medkg_graph::{Direction, GraphStore, MemoryGraph, NodeLabel};
///
/// let mut graph = MemoryGraph::new();
/// let pneumonia = graph.add_entity(NodeLabel::Disease, "肺炎");
/// let fever = graph.add_entity(NodeLabel::Symptom, "发热");
/// graph.add_edge(pneumonia, RelationType::HasSymptom, fever);
///
/// let edges = graph.neighbors("肺炎", Direction::Outgoing, 10).unwrap();
/// assert_eq!(edges[0].target.name(), "发热");
/// ```
#[derive(Debug, Default)]
pub struct MemoryGraph {
    graph: StableDiGraph<GraphNode, RelationType>,
    /// Node indices by exact `name`, in insertion order.
    name_index: HashMap<String, Vec<NodeIndex>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        let name = node.name().to_string();
        let idx = self.graph.add_node(node);
        self.name_index.entry(name).or_default().push(idx);
        idx
    }

    /// Add a node with only a `name` property.
    pub fn add_entity(&mut self, label: NodeLabel, name: &str) -> NodeIndex {
        self.add_node(GraphNode::named(label, name))
    }

    /// Add a node with a `name` plus extra properties.
    pub fn add_entity_with(
        &mut self,
        label: NodeLabel,
        name: &str,
        properties: PropertyMap,
    ) -> NodeIndex {
        let mut node = GraphNode::named(label, name);
        node.properties.extend(properties);
        self.add_node(node)
    }

    pub fn add_edge(
        &mut self,
        source: NodeIndex,
        relation: RelationType,
        target: NodeIndex,
    ) -> EdgeIndex {
        self.graph.add_edge(source, target, relation)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn nodes_named(&self, name: &str) -> &[NodeIndex] {
        self.name_index
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Edges touching nodes named `name`, oldest first.
    fn edges_of(&self, name: &str, direction: PetDirection) -> Vec<EdgeIndex> {
        let mut edges = Vec::new();
        for &idx in self.nodes_named(name) {
            let mut local: Vec<EdgeIndex> = self
                .graph
                .edges_directed(idx, direction)
                .map(|e| e.id())
                .collect();
            // petgraph walks adjacency lists newest-first.
            local.sort();
            edges.extend(local);
        }
        edges
    }

    fn to_edge(&self, idx: EdgeIndex) -> Option<GraphEdge> {
        let (source, target) = self.graph.edge_endpoints(idx)?;
        Some(GraphEdge::new(
            self.graph[source].clone(),
            self.graph.edge_weight(idx)?.clone(),
            self.graph[target].clone(),
        ))
    }

    fn collect(&self, indices: impl IntoIterator<Item = EdgeIndex>, limit: usize) -> Vec<GraphEdge> {
        indices
            .into_iter()
            .filter_map(|idx| self.to_edge(idx))
            .take(limit)
            .collect()
    }
}

impl GraphStore for MemoryGraph {
    fn find_entities(
        &self,
        name: &str,
        scope: LabelScope,
        limit: usize,
    ) -> GraphResult<Vec<GraphNode>> {
        Ok(self
            .nodes_named(name)
            .iter()
            .map(|&idx| &self.graph[idx])
            .filter(|node| scope.matches(node.label))
            .take(limit)
            .cloned()
            .collect())
    }

    fn relation_triples(
        &self,
        source: &str,
        target: &str,
        limit: usize,
    ) -> GraphResult<Vec<GraphEdge>> {
        let from_source = self.collect(self.edges_of(source, PetDirection::Outgoing), limit);
        let into_target = self.collect(self.edges_of(target, PetDirection::Incoming), limit);
        Ok(union_edges(from_source, into_target))
    }

    fn neighbors(
        &self,
        name: &str,
        direction: Direction,
        limit: usize,
    ) -> GraphResult<Vec<GraphEdge>> {
        let pet_direction = match direction {
            Direction::Outgoing => PetDirection::Outgoing,
            Direction::Incoming => PetDirection::Incoming,
        };
        Ok(self.collect(self.edges_of(name, pet_direction), limit))
    }

    fn health_check(&self) -> GraphResult<()> {
        Ok(())
    }
}
