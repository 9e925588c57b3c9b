//! The read-only store interface used by the query engine.

use crate::error::GraphResult;
use crate::types::{Direction, GraphEdge, GraphNode, LabelScope};

/// A property graph the engine can query.
///
/// Implementations must be safe to share between worker threads; every call
/// is independent and read-only.
pub trait GraphStore: Send + Sync {
    /// Nodes whose `name` equals `name` exactly, within `scope`.
    fn find_entities(
        &self,
        name: &str,
        scope: LabelScope,
        limit: usize,
    ) -> GraphResult<Vec<GraphNode>>;

    /// Union of up to `limit` edges leaving a node named `source` and up to
    /// `limit` edges entering a node named `target`. Duplicate rows appear once.
    fn relation_triples(
        &self,
        source: &str,
        target: &str,
        limit: usize,
    ) -> GraphResult<Vec<GraphEdge>>;

    /// Up to `limit` edges between a node named `name` and a domain neighbor,
    /// in one direction. Edges keep their stored direction.
    fn neighbors(
        &self,
        name: &str,
        direction: Direction,
        limit: usize,
    ) -> GraphResult<Vec<GraphEdge>>;

    /// Cheap round trip proving the store is reachable.
    fn health_check(&self) -> GraphResult<()>;
}
