//! # medkg Graph
//!
//! The read-only boundary between the query engine and the property graph.
//!
//! - [`GraphStore`]: the lookups the engine needs
//! - [`MemoryGraph`]: petgraph-backed store, used offline and in tests
//! - [`Neo4jHttpStore`]: Neo4j over the HTTP transactional API (`neo4j` feature)
//!
//! Raw records are validated into [`GraphNode`] / [`GraphEdge`]: a node must
//! carry one of the nine domain labels, an edge must carry a type.

mod error;
mod memory;
mod store;
mod types;

pub use error::{GraphError, GraphResult};
pub use memory::MemoryGraph;
pub use store::GraphStore;
pub use types::{union_edges, Direction, GraphEdge, GraphNode, LabelScope, NodeLabel};

#[cfg(feature = "neo4j")]
mod neo4j;
#[cfg(feature = "neo4j")]
pub use neo4j::{Neo4jConfig, Neo4jHttpStore};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{Direction, GraphEdge, GraphNode, GraphStore, LabelScope, MemoryGraph, NodeLabel};
    pub use crate::{GraphError, GraphResult};

    #[cfg(feature = "neo4j")]
    pub use crate::{Neo4jConfig, Neo4jHttpStore};
}
