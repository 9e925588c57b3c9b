//! Per-retrieval bookkeeping.
//!
//! A [`RetrievalContext`] is created for one call to
//! [`GraphQueryEngine::retrieve`](crate::GraphQueryEngine::retrieve) and dropped
//! when it returns, so an engine can serve concurrent questions.

use medkg_core::{RetrievalResult, Triple};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Entity names already scored against the question. Grow-only.
#[derive(Debug, Default)]
pub struct VisitedSet {
    names: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the name was not yet visited.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> HashSet<String> {
        self.names.clone()
    }
}

/// An entity that may seed second-hop expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub similarity: f32,
}

/// Mutable state threaded through the four traversal phases.
#[derive(Debug)]
pub struct RetrievalContext {
    pub question_embedding: Vec<f32>,
    pub visited: VisitedSet,
    candidates: Vec<Candidate>,
    pub result: RetrievalResult,
}

impl RetrievalContext {
    pub fn new(question_embedding: Vec<f32>) -> Self {
        Self {
            question_embedding,
            visited: VisitedSet::new(),
            candidates: Vec::new(),
            result: RetrievalResult::empty(),
        }
    }

    /// Register a multi-hop candidate; a name is registered at most once.
    pub fn add_candidate(&mut self, name: impl Into<String>, similarity: f32) {
        let name = name.into();
        if self.candidates.iter().any(|c| c.name == name) {
            return;
        }
        self.candidates.push(Candidate { name, similarity });
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// The `k` best candidates, highest similarity first; ties keep discovery order.
    pub fn top_candidates(&self, k: usize) -> Vec<Candidate> {
        let mut ranked = self.candidates.clone();
        ranked.sort_by(|a, b| by_similarity_desc(a.similarity, b.similarity));
        ranked.truncate(k);
        ranked
    }

    pub fn push_triple(&mut self, triple: Triple) {
        self.result.related_triples.push(triple);
    }

    /// Final ordering: stable sort by descending similarity.
    pub fn finish(mut self) -> RetrievalResult {
        sort_triples(&mut self.result.related_triples);
        self.result
    }
}

pub(crate) fn by_similarity_desc(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Stable sort, highest similarity first.
pub fn sort_triples(triples: &mut [Triple]) {
    triples.sort_by(|a, b| by_similarity_desc(a.similarity, b.similarity));
}

#[cfg(test)]
mod tests {
    use super::*;
    use medkg_core::PropertyMap;

    fn triple(relation: &str, similarity: f32) -> Triple {
        Triple {
            source: PropertyMap::new(),
            relation: relation.to_string(),
            target: PropertyMap::new(),
            similarity,
            hop: None,
        }
    }

    #[test]
    fn test_visited_set_only_grows() {
        let mut visited = VisitedSet::new();
        assert!(visited.insert("肺炎"));
        assert!(!visited.insert("肺炎"));
        assert!(visited.contains("肺炎"));
        assert_eq!(visited.len(), 1);
    }

    #[test]
    fn test_candidates_dedup_and_rank() {
        let mut ctx = RetrievalContext::new(vec![1.0]);
        ctx.add_candidate("a", 0.2);
        ctx.add_candidate("b", 0.9);
        ctx.add_candidate("a", 0.99);
        ctx.add_candidate("c", 0.9);

        assert_eq!(ctx.candidates().len(), 3);
        let top: Vec<String> = ctx.top_candidates(2).into_iter().map(|c| c.name).collect();
        assert_eq!(top, vec!["b", "c"]);
    }

    #[test]
    fn test_finish_sorts_stably() {
        let mut ctx = RetrievalContext::new(Vec::new());
        ctx.push_triple(triple("first", 0.5));
        ctx.push_triple(triple("low", -0.2));
        ctx.push_triple(triple("high", 0.8));
        ctx.push_triple(triple("second", 0.5));

        let result = ctx.finish();
        let order: Vec<&str> = result.related_triples.iter().map(|t| t.relation.as_str()).collect();
        assert_eq!(order, vec!["high", "first", "second", "low"]);
    }
}
