//! # medkg RAG
//!
//! Question answering grounded in a medical knowledge graph.
//!
//! ```text
//! question ─▶ EntityExtractor ─▶ GraphQueryEngine ─▶ AnswerSynthesizer ─▶ answer
//!               (completion)      (graph + embeddings)    (completion)
//! ```
//!
//! The engine walks the graph in four bounded phases (entity properties,
//! direct relations, first hop, second hop) and ranks what it finds against
//! the question's embedding. Service failures degrade the result instead of
//! aborting it.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use medkg_core::RelationType;
//! use medkg_embeddings::HashEmbedder;
//! use medkg_graph::{MemoryGraph, NodeLabel};
//! use medkg_llm::MockBackend;
//! use medkg_rag::QaPipeline;
//!
//! let mut graph = MemoryGraph::new();
//! let pneumonia = graph.add_entity(NodeLabel::Disease, "肺炎");
//! let fever = graph.add_entity(NodeLabel::Symptom, "发热");
//! graph.add_edge(pneumonia, RelationType::HasSymptom, fever);
//!
//! let llm = MockBackend::new()
//!     .with_response(
//!         "请从以下文本中提取",
//!         r#"{"entities": [{"name": "肺炎", "type": "Disease"}], "relations": []}"#,
//!     )
//!     .with_default_response("肺炎常见症状为发热。");
//!
//! let pipeline = QaPipeline::new(Arc::new(llm), Arc::new(graph), Arc::new(HashEmbedder::default()));
//! assert_eq!(pipeline.answer("肺炎有什么症状？").unwrap(), "肺炎常见症状为发热。");
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod events;
pub mod extract;
pub mod pipeline;
pub mod prelude;
pub mod synthesize;

pub use context::{Candidate, RetrievalContext, VisitedSet};
pub use engine::{GraphQueryEngine, RetrievalOptions, FIRST_HOP_SIMILARITY, PER_RELATION_CAP};
pub use error::{PipelineError, PipelineResult};
pub use events::{Phase, PipelineEvent, ProgressSink};
pub use extract::{parse_extraction, EntityExtractor, EXTRACTION_TEMPERATURE};
pub use pipeline::{PipelineHandle, QaOutcome, QaPipeline};
pub use synthesize::{
    AnswerSynthesizer, ANSWER_TEMPERATURE, APOLOGY, INSUFFICIENT_INFORMATION, PROMPT_CHAR_LIMIT,
};
