//! End-to-end question answering against the in-memory graph.

use medkg_core::{BudgetProfile, RelationType, RetrievalResult};
use medkg_embeddings::HashEmbedder;
use medkg_graph::{
    Direction, GraphEdge, GraphError, GraphNode, GraphResult, GraphStore, LabelScope, MemoryGraph,
    NodeLabel,
};
use medkg_llm::MockBackend;
use medkg_rag::*;
use std::sync::Arc;

const EXTRACTION_MARKER: &str = "请从以下文本中提取";

const PNEUMONIA_EXTRACTION: &str = r#"{
    "entities": [{"name": "肺炎", "type": "Disease"}],
    "relations": [{"source": "肺炎", "target": "症状", "type": "HAS_SYMPTOM"}]
}"#;

/// 肺炎 -> 发热 <- 流感
fn graph() -> MemoryGraph {
    let mut g = MemoryGraph::new();
    let pneumonia = g.add_entity(NodeLabel::Disease, "肺炎");
    let fever = g.add_entity(NodeLabel::Symptom, "发热");
    let flu = g.add_entity(NodeLabel::Disease, "流感");
    g.add_edge(pneumonia, RelationType::HasSymptom, fever);
    g.add_edge(flu, RelationType::HasSymptom, fever);
    g
}

fn llm(extraction: &str) -> Arc<MockBackend> {
    Arc::new(
        MockBackend::new()
            .with_response(EXTRACTION_MARKER, extraction)
            .with_default_response("肺炎的常见症状包括发热。"),
    )
}

fn pipeline(llm: Arc<MockBackend>, store: Arc<dyn GraphStore>) -> QaPipeline {
    QaPipeline::new(llm, store, Arc::new(HashEmbedder::new(128)))
}

/// Every lookup fails as if the database were unreachable.
struct UnreachableStore;

impl GraphStore for UnreachableStore {
    fn find_entities(&self, _: &str, _: LabelScope, _: usize) -> GraphResult<Vec<GraphNode>> {
        Err(GraphError::ConnectionFailed("connection refused".into()))
    }

    fn relation_triples(&self, _: &str, _: &str, _: usize) -> GraphResult<Vec<GraphEdge>> {
        Err(GraphError::Http {
            status: 503,
            body: "unavailable".into(),
        })
    }

    fn neighbors(&self, _: &str, _: Direction, _: usize) -> GraphResult<Vec<GraphEdge>> {
        Err(GraphError::ConnectionFailed("connection refused".into()))
    }

    fn health_check(&self) -> GraphResult<()> {
        Err(GraphError::ConnectionFailed("connection refused".into()))
    }
}

/// Lookups for one entity name fail; everything else reads the graph.
struct PartlyFailingStore {
    inner: MemoryGraph,
    broken: &'static str,
}

impl PartlyFailingStore {
    fn check(&self, name: &str) -> GraphResult<()> {
        if name == self.broken {
            return Err(GraphError::Query {
                code: "Neo.ClientError.Statement.SyntaxError".into(),
                message: format!("cannot read {}", name),
            });
        }
        Ok(())
    }
}

impl GraphStore for PartlyFailingStore {
    fn find_entities(
        &self,
        name: &str,
        scope: LabelScope,
        limit: usize,
    ) -> GraphResult<Vec<GraphNode>> {
        self.check(name)?;
        self.inner.find_entities(name, scope, limit)
    }

    fn relation_triples(
        &self,
        source: &str,
        target: &str,
        limit: usize,
    ) -> GraphResult<Vec<GraphEdge>> {
        self.check(source)?;
        self.inner.relation_triples(source, target, limit)
    }

    fn neighbors(
        &self,
        name: &str,
        direction: Direction,
        limit: usize,
    ) -> GraphResult<Vec<GraphEdge>> {
        self.check(name)?;
        self.inner.neighbors(name, direction, limit)
    }

    fn health_check(&self) -> GraphResult<()> {
        Ok(())
    }
}

#[test]
fn answers_symptom_question_from_graph_facts() {
    let llm = llm(PNEUMONIA_EXTRACTION);
    let pipeline = pipeline(llm.clone(), Arc::new(graph()));

    let outcome = pipeline.run("肺炎有什么症状？", &()).unwrap();

    let retrieval = &outcome.retrieval;
    assert_eq!(retrieval.entity_properties.len(), 1);
    assert_eq!(retrieval.entity_properties[0].name, "肺炎");
    assert!(retrieval
        .related_triples
        .iter()
        .any(|t| t.relation == "HAS_SYMPTOM" && t.target_name() == "发热"));
    assert_eq!(outcome.answer, "肺炎的常见症状包括发热。");

    let calls = llm.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1, EXTRACTION_TEMPERATURE);
    assert_eq!(calls[1].1, ANSWER_TEMPERATURE);
    assert!(calls[1].0.contains("发热"));
}

#[test]
fn triples_are_sorted_by_similarity() {
    let pipeline = pipeline(llm(PNEUMONIA_EXTRACTION), Arc::new(graph()));

    let triples = pipeline.run("肺炎有什么症状？", &()).unwrap().retrieval.related_triples;

    assert!(triples
        .windows(2)
        .all(|pair| pair[0].similarity >= pair[1].similarity));
    // The direct relation and its first-hop copy both survive; only the
    // first-hop copy carries the flat score.
    assert!(triples
        .iter()
        .any(|t| t.target_name() == "发热" && t.similarity == FIRST_HOP_SIMILARITY));
}

#[test]
fn malformed_extraction_yields_insufficient_information() {
    let llm = llm("这不是JSON");
    let pipeline = pipeline(llm.clone(), Arc::new(graph()));

    let outcome = pipeline.run("肺炎有什么症状？", &()).unwrap();

    assert!(outcome.extraction.is_empty());
    assert!(outcome.retrieval.is_empty());
    assert_eq!(outcome.answer, INSUFFICIENT_INFORMATION);
    // Only the extraction completion was made.
    assert_eq!(llm.call_count(), 1);
}

#[test]
fn empty_extraction_retrieves_nothing() {
    let engine = GraphQueryEngine::new(Arc::new(graph()), Arc::new(HashEmbedder::default()));
    let result = engine.retrieve(&[], &[], &RetrievalOptions::default());
    assert_eq!(result, RetrievalResult::empty());
}

#[test]
fn unknown_budget_behaves_like_deeper() {
    let options = RetrievalOptions::with_budget_name("Shallowest");
    assert_eq!(options, RetrievalOptions::default());

    let extraction = parse_extraction(PNEUMONIA_EXTRACTION);
    let engine = GraphQueryEngine::new(Arc::new(graph()), Arc::new(HashEmbedder::default()));
    let fallback = engine.retrieve(&extraction.entities, &extraction.relations, &options);
    let deeper = engine.retrieve(
        &extraction.entities,
        &extraction.relations,
        &RetrievalOptions::new(BudgetProfile::deeper()),
    );
    assert_eq!(fallback, deeper);
}

#[test]
fn repeated_questions_return_the_same_facts() {
    let pipeline = pipeline(llm(PNEUMONIA_EXTRACTION), Arc::new(graph()));

    let first = pipeline.run("肺炎有什么症状？", &()).unwrap().retrieval;
    let second = pipeline.run("肺炎有什么症状？", &()).unwrap().retrieval;

    assert_eq!(first, second);
}

#[test]
fn store_failures_degrade_to_an_empty_result() {
    let llm = llm(PNEUMONIA_EXTRACTION);
    let pipeline = pipeline(llm.clone(), Arc::new(UnreachableStore));

    let outcome = pipeline.run("肺炎有什么症状？", &()).unwrap();

    assert_eq!(outcome.extraction.entities.len(), 1);
    assert!(outcome.retrieval.is_empty());
    assert_eq!(outcome.answer, INSUFFICIENT_INFORMATION);
    assert_eq!(llm.call_count(), 1);
}

#[test]
fn failing_extraction_yields_insufficient_information() {
    let pipeline = pipeline(Arc::new(MockBackend::failing()), Arc::new(graph()));
    // Extraction fails first, so nothing is retrieved.
    assert_eq!(pipeline.answer("肺炎有什么症状？").unwrap(), INSUFFICIENT_INFORMATION);
}

#[test]
fn second_hop_reaches_unvisited_neighbors() {
    let pipeline = pipeline(llm(PNEUMONIA_EXTRACTION), Arc::new(graph()));

    let retrieval = pipeline.run("肺炎有什么症状？", &()).unwrap().retrieval;

    assert_eq!(retrieval.second_hop_count(), 1);
    let hop = retrieval
        .related_triples
        .iter()
        .find(|t| t.is_second_hop())
        .unwrap();
    assert_eq!(hop.source_name(), "流感");
    assert_eq!(hop.target_name(), "发热");
}

#[test]
fn disabling_multi_hop_skips_the_second_hop() {
    let pipeline = pipeline(llm(PNEUMONIA_EXTRACTION), Arc::new(graph()))
        .with_options(RetrievalOptions::default().with_multi_hop(false));

    let (tx, rx) = std::sync::mpsc::channel();
    let retrieval = pipeline.run("肺炎有什么症状？", &tx).unwrap().retrieval;
    drop(tx);

    assert_eq!(retrieval.second_hop_count(), 0);
    let phases: Vec<Phase> = rx
        .iter()
        .filter_map(|event| match event {
            PipelineEvent::PhaseCompleted { phase, .. } => Some(phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![Phase::EntityProperties, Phase::DirectRelations, Phase::FirstHop]
    );
}

#[test]
fn spawned_run_streams_events_and_finishes_once() {
    let pipeline = Arc::new(pipeline(llm(PNEUMONIA_EXTRACTION), Arc::new(graph())));

    let (events, result) = pipeline.spawn("  肺炎有什么症状？ ").drain();

    let outcome = result.unwrap();
    assert_eq!(outcome.question, "肺炎有什么症状？");
    assert_eq!(
        events.first(),
        Some(&PipelineEvent::Started {
            question: "肺炎有什么症状？".into()
        })
    );
    assert_eq!(
        events[1],
        PipelineEvent::Extracted {
            entities: 1,
            relations: 1
        }
    );
    assert!(events.contains(&PipelineEvent::Answer {
        text: outcome.answer.clone()
    }));
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert_eq!(events.last(), Some(&PipelineEvent::Finished));
}

#[test]
fn spawned_empty_question_fails_then_finishes() {
    let llm = llm(PNEUMONIA_EXTRACTION);
    let pipeline = Arc::new(pipeline(llm.clone(), Arc::new(graph())));

    let (events, result) = pipeline.spawn("   ").drain();

    assert!(matches!(result, Err(PipelineError::EmptyQuestion)));
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], PipelineEvent::Failed { .. }));
    assert_eq!(events[1], PipelineEvent::Finished);
    assert_eq!(llm.call_count(), 0);
}

#[test]
fn concurrent_questions_share_one_pipeline() {
    let pipeline = Arc::new(pipeline(llm(PNEUMONIA_EXTRACTION), Arc::new(graph())));

    let handles: Vec<PipelineHandle> = (0..4)
        .map(|_| pipeline.spawn("肺炎有什么症状？"))
        .collect();
    let results: Vec<RetrievalResult> = handles
        .into_iter()
        .map(|h| h.wait().unwrap().retrieval)
        .collect();

    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn one_failing_entity_does_not_drop_the_others() {
    let llm = llm(
        r#"{
        "entities": [{"name": "坏", "type": "Disease"}, {"name": "肺炎", "type": "Disease"}],
        "relations": []
    }"#,
    );
    let mut g = graph();
    g.add_entity(NodeLabel::Disease, "坏");
    let store = PartlyFailingStore {
        inner: g,
        broken: "坏",
    };
    let pipeline = pipeline(llm.clone(), Arc::new(store));

    let outcome = pipeline.run("坏和肺炎有什么症状？", &()).unwrap();

    let retrieval = &outcome.retrieval;
    assert_eq!(outcome.extraction.entities.len(), 2);
    let names: Vec<&str> = retrieval
        .entity_properties
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, vec!["肺炎"]);
    assert!(retrieval
        .related_triples
        .iter()
        .any(|t| t.source_name() == "肺炎" && t.target_name() == "发热"));
    assert!(retrieval
        .related_triples
        .iter()
        .all(|t| t.source_name() != "坏" && t.target_name() != "坏"));
    assert_eq!(llm.call_count(), 2);
}
