//! Multi-phase graph retrieval.
//!
//! Strategy:
//! 1. Entity properties: exact-name lookups, each match seeds a multi-hop candidate
//! 2. Direct relations: source/target anchored edges, ranked by embedding similarity
//! 3. First hop: neighbors in both directions at a flat similarity, capped per
//!    relation type
//! 4. Second hop (optional): neighbors of the best candidates that were never
//!    visited, each scored individually
//!
//! Every phase is bounded by the [`BudgetProfile`]. A failing lookup is logged
//! and skipped; the engine returns whatever it collected.

use medkg_core::{
    BudgetProfile, Entity, EntityProperty, Relation, RelationType, RetrievalResult, SecondHop,
    Triple,
};
use medkg_embeddings::Embedder;
use medkg_graph::{Direction, GraphEdge, GraphStore, LabelScope};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::{sort_triples, RetrievalContext};
use crate::events::{Phase, PipelineEvent, ProgressSink};

/// Similarity assigned to every first-hop triple.
pub const FIRST_HOP_SIMILARITY: f32 = 0.5;

/// First-hop results kept per relation type and direction.
pub const PER_RELATION_CAP: usize = 5;

/// Per-call retrieval settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOptions {
    pub budget: BudgetProfile,
    /// Run phase 4.
    pub enable_multi_hop: bool,
}

impl RetrievalOptions {
    pub fn new(budget: BudgetProfile) -> Self {
        Self {
            budget,
            enable_multi_hop: true,
        }
    }

    /// Resolve a profile by name; unknown names fall back to `Deeper`.
    pub fn with_budget_name(name: &str) -> Self {
        Self::new(BudgetProfile::by_name(name))
    }

    pub fn with_multi_hop(mut self, enabled: bool) -> Self {
        self.enable_multi_hop = enabled;
        self
    }
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self::new(BudgetProfile::deeper())
    }
}

/// Text embedded once per retrieval to represent the question.
pub fn question_text(entities: &[&Entity], relations: &[&Relation]) -> String {
    entities
        .iter()
        .map(|e| e.name.as_str())
        .chain(relations.iter().map(|r| r.relation_type.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep at most `cap` edges per relation type; groups keep first-seen order.
pub fn cap_per_relation(edges: Vec<GraphEdge>, cap: usize) -> Vec<GraphEdge> {
    let mut groups: Vec<(RelationType, Vec<GraphEdge>)> = Vec::new();
    for edge in edges {
        match groups.iter_mut().find(|(relation, _)| *relation == edge.relation) {
            Some((_, group)) => {
                if group.len() < cap {
                    group.push(edge);
                }
            }
            None if cap > 0 => groups.push((edge.relation.clone(), vec![edge])),
            None => {}
        }
    }
    groups.into_iter().flat_map(|(_, group)| group).collect()
}

fn to_triple(edge: GraphEdge, similarity: f32, hop: Option<SecondHop>) -> Triple {
    Triple {
        source: edge.source.properties,
        relation: edge.relation.into(),
        target: edge.target.properties,
        similarity,
        hop,
    }
}

/// Retrieval engine. Holds only shared, read-only collaborators.
pub struct GraphQueryEngine {
    store: Arc<dyn GraphStore>,
    embedder: Arc<dyn Embedder>,
}

impl GraphQueryEngine {
    pub fn new(store: Arc<dyn GraphStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Retrieve a ranked, deduplicated fact set for the extracted entities and relations.
    pub fn retrieve(
        &self,
        entities: &[Entity],
        relations: &[Relation],
        options: &RetrievalOptions,
    ) -> RetrievalResult {
        self.retrieve_with_progress(entities, relations, options, &())
    }

    /// [`retrieve`](Self::retrieve), reporting running totals after each phase.
    pub fn retrieve_with_progress(
        &self,
        entities: &[Entity],
        relations: &[Relation],
        options: &RetrievalOptions,
        progress: &dyn ProgressSink,
    ) -> RetrievalResult {
        let entities: Vec<&Entity> = entities.iter().filter(|e| !e.is_empty()).collect();
        let relations: Vec<&Relation> = relations.iter().filter(|r| !r.is_empty()).collect();

        if entities.is_empty() && relations.is_empty() {
            info!("Nothing to look up; returning an empty result");
            return RetrievalResult::empty();
        }

        let budget = &options.budget;
        let question = question_text(&entities, &relations);
        let mut ctx = RetrievalContext::new(self.embedder.embed_or_empty(&question));

        let report = |ctx: &RetrievalContext, phase: Phase| {
            info!(
                phase = phase.as_str(),
                entity_properties = ctx.result.entity_properties.len(),
                triples = ctx.result.related_triples.len(),
                "Phase complete"
            );
            progress.emit(PipelineEvent::PhaseCompleted {
                phase,
                entity_properties: ctx.result.entity_properties.len(),
                triples: ctx.result.related_triples.len(),
            });
        };

        self.entity_properties(&entities, budget, &mut ctx);
        report(&ctx, Phase::EntityProperties);

        self.direct_relations(&relations, budget, &mut ctx);
        report(&ctx, Phase::DirectRelations);

        self.first_hop(&entities, budget, &mut ctx);
        report(&ctx, Phase::FirstHop);

        if options.enable_multi_hop {
            self.second_hop(budget, &mut ctx);
            report(&ctx, Phase::SecondHop);
        }

        let result = ctx.finish();
        info!(
            budget = %budget.name,
            entity_properties = result.entity_properties.len(),
            triples = result.related_triples.len(),
            second_hop = result.second_hop_count(),
            "Retrieval finished"
        );
        result
    }

    fn score(&self, ctx: &RetrievalContext, text: &str) -> f32 {
        let vector = self.embedder.embed_or_empty(text);
        self.embedder.similarity(&ctx.question_embedding, &vector)
    }

    /// Phase 1.
    fn entity_properties(
        &self,
        entities: &[&Entity],
        budget: &BudgetProfile,
        ctx: &mut RetrievalContext,
    ) {
        for entity in entities {
            ctx.visited.insert(&entity.name);

            let scope = LabelScope::for_entity(entity.entity_type);
            let nodes = match self
                .store
                .find_entities(&entity.name, scope, budget.entity_limit)
            {
                Ok(nodes) => nodes,
                Err(e) => {
                    warn!(entity = %entity.name, "Entity lookup failed: {}", e);
                    continue;
                }
            };

            if nodes.is_empty() {
                debug!(entity = %entity.name, "No matching node");
                continue;
            }

            for node in nodes {
                ctx.result.entity_properties.push(EntityProperty {
                    name: entity.name.clone(),
                    entity_type: entity.entity_type,
                    properties: node.properties,
                });
            }

            let similarity = self.score(ctx, &entity.name);
            ctx.add_candidate(entity.name.clone(), similarity);
        }
    }

    /// Phase 2.
    fn direct_relations(
        &self,
        relations: &[&Relation],
        budget: &BudgetProfile,
        ctx: &mut RetrievalContext,
    ) {
        for relation in relations {
            let edges = match self.store.relation_triples(
                &relation.source,
                &relation.target,
                budget.relation_limit,
            ) {
                Ok(edges) => edges,
                Err(e) => {
                    warn!(
                        source = %relation.source,
                        target = %relation.target,
                        "Relation lookup failed: {}",
                        e
                    );
                    continue;
                }
            };

            let mut scored: Vec<Triple> = edges
                .into_iter()
                .map(|edge| {
                    let anchor = if edge.source.name().is_empty() {
                        edge.target.name()
                    } else {
                        edge.source.name()
                    };
                    let text = format!("{} {}", anchor, edge.relation.as_str());
                    let similarity = self.score(ctx, &text);
                    to_triple(edge, similarity, None)
                })
                .collect();

            sort_triples(&mut scored);
            scored.truncate(budget.top_k_triples);
            debug!(
                source = %relation.source,
                relation = %relation.relation_type,
                kept = scored.len(),
                "Scored relation triples"
            );
            ctx.result.related_triples.extend(scored);
        }
    }

    /// Phase 3.
    fn first_hop(&self, entities: &[&Entity], budget: &BudgetProfile, ctx: &mut RetrievalContext) {
        for entity in entities {
            for direction in [Direction::Outgoing, Direction::Incoming] {
                let edges = match self
                    .store
                    .neighbors(&entity.name, direction, budget.one_hop_limit)
                {
                    Ok(edges) => edges,
                    Err(e) => {
                        warn!(entity = %entity.name, ?direction, "Neighbor lookup failed: {}", e);
                        continue;
                    }
                };

                for edge in cap_per_relation(edges, PER_RELATION_CAP) {
                    let neighbor = edge.neighbor(direction).name().to_string();
                    ctx.push_triple(to_triple(edge, FIRST_HOP_SIMILARITY, None));

                    if !neighbor.is_empty() && ctx.visited.insert(&neighbor) {
                        let similarity = self.score(ctx, &neighbor);
                        ctx.add_candidate(neighbor, similarity);
                    }
                }
            }
        }
    }

    /// Phase 4.
    fn second_hop(&self, budget: &BudgetProfile, ctx: &mut RetrievalContext) {
        let seeds = ctx.top_candidates(budget.top_k_multi_hop_entities);
        debug!(
            seeds = ?seeds.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "Second-hop seeds"
        );

        for seed in seeds {
            for direction in [Direction::Outgoing, Direction::Incoming] {
                let edges = match self
                    .store
                    .neighbors(&seed.name, direction, budget.multi_hop_limit)
                {
                    Ok(edges) => edges,
                    Err(e) => {
                        warn!(entity = %seed.name, ?direction, "Second-hop lookup failed: {}", e);
                        continue;
                    }
                };

                for edge in edges {
                    let neighbor = edge.neighbor(direction).name().to_string();
                    if neighbor.is_empty() || !ctx.visited.insert(&neighbor) {
                        continue;
                    }
                    let similarity = self.score(ctx, &neighbor);
                    ctx.push_triple(to_triple(edge, similarity, Some(SecondHop)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medkg_core::EntityType;
    use medkg_embeddings::HashEmbedder;
    use medkg_graph::{GraphNode, GraphResult, MemoryGraph, NodeLabel};
    use std::sync::Mutex;

    fn edge(source: &str, relation: RelationType, target: &str) -> GraphEdge {
        GraphEdge::new(
            GraphNode::named(NodeLabel::Disease, source),
            relation,
            GraphNode::named(NodeLabel::Symptom, target),
        )
    }

    /// 肺炎 -> 6 symptoms and 1 department; 流感 and 感冒 -> 发热.
    fn graph() -> MemoryGraph {
        let mut g = MemoryGraph::new();
        let pneumonia = g.add_entity(NodeLabel::Disease, "肺炎");
        let mut symptoms = Vec::new();
        for name in ["发热", "咳嗽", "胸痛", "咳痰", "气促", "乏力"] {
            let s = g.add_entity(NodeLabel::Symptom, name);
            g.add_edge(pneumonia, RelationType::HasSymptom, s);
            symptoms.push(s);
        }
        let dept = g.add_entity(NodeLabel::Department, "呼吸内科");
        g.add_edge(pneumonia, RelationType::TreatedBy, dept);

        let flu = g.add_entity(NodeLabel::Disease, "流感");
        let cold = g.add_entity(NodeLabel::Disease, "感冒");
        g.add_edge(flu, RelationType::HasSymptom, symptoms[0]);
        g.add_edge(cold, RelationType::HasSymptom, symptoms[0]);
        g
    }

    fn engine(g: MemoryGraph) -> GraphQueryEngine {
        GraphQueryEngine::new(Arc::new(g), Arc::new(HashEmbedder::new(128)))
    }

    /// Records the limit passed to every relation lookup.
    struct RecordingStore {
        inner: MemoryGraph,
        relation_limits: Mutex<Vec<usize>>,
    }

    impl GraphStore for RecordingStore {
        fn find_entities(
            &self,
            name: &str,
            scope: LabelScope,
            limit: usize,
        ) -> GraphResult<Vec<GraphNode>> {
            self.inner.find_entities(name, scope, limit)
        }

        fn relation_triples(
            &self,
            source: &str,
            target: &str,
            limit: usize,
        ) -> GraphResult<Vec<GraphEdge>> {
            self.relation_limits.lock().unwrap().push(limit);
            self.inner.relation_triples(source, target, limit)
        }

        fn neighbors(
            &self,
            name: &str,
            direction: Direction,
            limit: usize,
        ) -> GraphResult<Vec<GraphEdge>> {
            self.inner.neighbors(name, direction, limit)
        }

        fn health_check(&self) -> GraphResult<()> {
            Ok(())
        }
    }

    /// 肺炎 with eight symptoms.
    fn wide_graph() -> MemoryGraph {
        let mut g = MemoryGraph::new();
        let pneumonia = g.add_entity(NodeLabel::Disease, "肺炎");
        for name in ["发热", "咳嗽", "胸痛", "咳痰", "气促", "乏力", "头痛", "寒战"] {
            let s = g.add_entity(NodeLabel::Symptom, name);
            g.add_edge(pneumonia, RelationType::HasSymptom, s);
        }
        g
    }

    #[test]
    fn test_question_text() {
        let e = Entity::new("肺炎", EntityType::Disease);
        let r = Relation::new("肺炎", "症状", RelationType::HasSymptom);
        assert_eq!(question_text(&[&e], &[&r]), "肺炎 HAS_SYMPTOM");
        assert_eq!(question_text(&[], &[]), "");
    }

    #[test]
    fn test_cap_per_relation_groups_in_first_seen_order() {
        let mut edges = Vec::new();
        for i in 0..7 {
            edges.push(edge("肺炎", RelationType::HasSymptom, &format!("s{}", i)));
            if i == 1 {
                edges.push(edge("肺炎", RelationType::TreatedBy, "呼吸内科"));
            }
        }

        let capped = cap_per_relation(edges, 5);
        let relations: Vec<RelationType> = capped.iter().map(|e| e.relation.clone()).collect();
        assert_eq!(capped.len(), 6);
        assert!(relations[..5].iter().all(|r| *r == RelationType::HasSymptom));
        assert_eq!(relations[5], RelationType::TreatedBy);
        assert_eq!(capped[4].target.name(), "s4");
    }

    #[test]
    fn test_first_hop_caps_and_registers_neighbors() {
        let engine = engine(graph());
        let entity = Entity::new("肺炎", EntityType::Disease);
        let mut ctx = RetrievalContext::new(Vec::new());
        ctx.visited.insert("肺炎");

        engine.first_hop(&[&entity], &BudgetProfile::deeper(), &mut ctx);

        // 5 of 6 symptoms plus the department; no incoming edges.
        assert_eq!(ctx.result.related_triples.len(), 6);
        assert!(ctx
            .result
            .related_triples
            .iter()
            .all(|t| t.similarity == FIRST_HOP_SIMILARITY && t.hop.is_none()));
        assert!(ctx.visited.contains("呼吸内科"));
        assert!(!ctx.visited.contains("乏力"));
        assert_eq!(ctx.candidates().len(), 6);
    }

    #[test]
    fn test_incoming_neighbors_register_the_neighbor_name() {
        let engine = engine(graph());
        let entity = Entity::new("发热", EntityType::Symptom);
        let mut ctx = RetrievalContext::new(Vec::new());
        ctx.visited.insert("发热");

        engine.first_hop(&[&entity], &BudgetProfile::deeper(), &mut ctx);

        let names: Vec<&str> = ctx.candidates().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["肺炎", "流感", "感冒"]);
        // Stored direction is kept: the disease is the source.
        assert!(ctx.result.related_triples.iter().all(|t| t.target_name() == "发热"));
    }

    #[test]
    fn test_second_hop_never_revisits() {
        let engine = engine(graph());
        let entity = Entity::new("肺炎", EntityType::Disease);
        let budget = BudgetProfile {
            top_k_multi_hop_entities: 10,
            ..BudgetProfile::deeper()
        };
        let mut ctx = RetrievalContext::new(engine.embedder.embed_or_empty("肺炎"));

        engine.entity_properties(&[&entity], &budget, &mut ctx);
        engine.first_hop(&[&entity], &budget, &mut ctx);
        let before = ctx.visited.snapshot();
        let visited_before = ctx.visited.len();

        engine.second_hop(&budget, &mut ctx);

        let second: Vec<&Triple> = ctx
            .result
            .related_triples
            .iter()
            .filter(|t| t.is_second_hop())
            .collect();
        assert!(!second.is_empty());

        let mut new_names = Vec::new();
        for triple in &second {
            let fresh: Vec<&str> = [triple.source_name(), triple.target_name()]
                .into_iter()
                .filter(|n| !before.contains(*n))
                .collect();
            assert_eq!(fresh.len(), 1, "exactly one endpoint is new: {:?}", triple);
            new_names.push(fresh[0]);
        }
        let unique: std::collections::HashSet<&str> = new_names.iter().copied().collect();
        assert_eq!(unique.len(), new_names.len());
        assert_eq!(ctx.visited.len(), visited_before + new_names.len());
        assert!(new_names.contains(&"流感"));
        assert!(new_names.contains(&"感冒"));
        assert!(!ctx.visited.contains("乏力"));
    }

    #[test]
    fn test_direct_relations_keep_top_k_in_descending_order() {
        let store = Arc::new(RecordingStore {
            inner: wide_graph(),
            relation_limits: Mutex::new(Vec::new()),
        });
        let engine = GraphQueryEngine::new(store.clone(), Arc::new(HashEmbedder::new(128)));
        let relation = Relation::new("肺炎", "症状", RelationType::HasSymptom);
        let budget = BudgetProfile::deeper();
        let mut ctx = RetrievalContext::new(engine.embedder.embed_or_empty("肺炎 症状"));

        engine.direct_relations(&[&relation], &budget, &mut ctx);

        assert_eq!(*store.relation_limits.lock().unwrap(), vec![budget.relation_limit]);
        let triples = &ctx.result.related_triples;
        assert_eq!(triples.len(), budget.top_k_triples);
        assert!(triples.iter().all(|t| t.hop.is_none()));
        assert!(triples
            .windows(2)
            .all(|pair| pair[0].similarity >= pair[1].similarity));
    }

    #[test]
    fn test_direct_relations_bounded_by_relation_limit() {
        let store = Arc::new(RecordingStore {
            inner: wide_graph(),
            relation_limits: Mutex::new(Vec::new()),
        });
        let engine = GraphQueryEngine::new(store.clone(), Arc::new(HashEmbedder::new(128)));
        let relation = Relation::new("肺炎", "症状", RelationType::HasSymptom);
        let budget = BudgetProfile {
            relation_limit: 3,
            ..BudgetProfile::deeper()
        };
        let mut ctx = RetrievalContext::new(Vec::new());

        engine.direct_relations(&[&relation], &budget, &mut ctx);

        assert_eq!(*store.relation_limits.lock().unwrap(), vec![3]);
        assert_eq!(ctx.result.related_triples.len(), 3);
    }

    #[test]
    fn test_entity_properties_bounded_by_entity_limit() {
        let mut g = MemoryGraph::new();
        g.add_entity(NodeLabel::Disease, "肺炎");
        g.add_entity(NodeLabel::Disease, "肺炎");
        let engine = engine(g);
        let entity = Entity::new("肺炎", EntityType::Disease);

        let one = BudgetProfile {
            entity_limit: 1,
            ..BudgetProfile::deeper()
        };
        let mut ctx = RetrievalContext::new(Vec::new());
        engine.entity_properties(&[&entity], &one, &mut ctx);
        assert_eq!(ctx.result.entity_properties.len(), 1);

        let mut ctx = RetrievalContext::new(Vec::new());
        engine.entity_properties(&[&entity], &BudgetProfile::deeper(), &mut ctx);
        assert_eq!(ctx.result.entity_properties.len(), 2);
        // One candidate per entity, however many nodes match.
        assert_eq!(ctx.candidates().len(), 1);
    }
}
