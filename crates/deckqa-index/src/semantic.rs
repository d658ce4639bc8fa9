//! Cosine-similarity scoring over chunk embeddings.

use std::sync::Arc;

use deckqa_core::traits::Matcher;
use deckqa_core::types::{MatchSource, QueryContext, ScoredChunk};

use crate::corpus::CorpusIndex;

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Scores chunks by cosine similarity between the query embedding and the
/// per-chunk vectors. Degrades to an empty result (never an error) when the
/// query has no embedding or the corpus shipped without vectors; the
/// orchestrator treats that as "strategy unavailable".
pub struct SemanticMatcher {
    index: Arc<CorpusIndex>,
}

impl SemanticMatcher {
    pub fn new(index: Arc<CorpusIndex>) -> Self {
        Self { index }
    }
}

impl Matcher for SemanticMatcher {
    fn source(&self) -> MatchSource {
        MatchSource::Semantic
    }

    fn score(&self, query: &QueryContext) -> Vec<ScoredChunk> {
        let Some(query_vec) = query.embedding.as_deref() else {
            return Vec::new();
        };
        if !self.index.has_embeddings() {
            return Vec::new();
        }

        let mut hits: Vec<ScoredChunk> = self
            .index
            .chunks()
            .iter()
            .filter_map(|chunk| {
                let embedding = chunk.embedding.as_deref()?;
                let sim = cosine_similarity(query_vec, embedding);
                // opposite-direction vectors carry no relevance signal
                (sim > 0.0).then(|| {
                    ScoredChunk::new(
                        chunk.id.clone(),
                        chunk.slide_number,
                        sim,
                        MatchSource::Semantic,
                    )
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.slide_number.cmp(&b.slide_number))
        });
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckqa_core::types::Chunk;

    fn chunk(id: &str, slide: u32, embedding: Option<Vec<f32>>) -> Chunk {
        Chunk {
            id: id.into(),
            title: String::new(),
            slide_number: slide,
            content: "content".into(),
            source_file: "deck.pptx".into(),
            embedding,
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        assert!((cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_handles_mismatched_and_zero_vectors() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn no_embeddings_in_index_yields_empty_not_error() {
        let index = Arc::new(CorpusIndex::load(vec![chunk("c1", 1, None)]).unwrap());
        let m = SemanticMatcher::new(index);
        let query = QueryContext {
            text: "anything".into(),
            tokens: vec!["anything".into()],
            embedding: Some(vec![1.0, 0.0]),
        };
        assert!(m.score(&query).is_empty());
    }

    #[test]
    fn no_query_embedding_yields_empty() {
        let index = Arc::new(
            CorpusIndex::load(vec![chunk("c1", 1, Some(vec![1.0, 0.0]))]).unwrap(),
        );
        let m = SemanticMatcher::new(index);
        assert!(m.score(&QueryContext::default()).is_empty());
    }

    #[test]
    fn closest_vector_ranks_first() {
        let index = Arc::new(
            CorpusIndex::load(vec![
                chunk("far", 1, Some(vec![0.1, 0.9])),
                chunk("near", 2, Some(vec![0.9, 0.1])),
                chunk("blind", 3, None),
            ])
            .unwrap(),
        );
        let m = SemanticMatcher::new(index);
        let query = QueryContext {
            text: String::new(),
            tokens: Vec::new(),
            embedding: Some(vec![1.0, 0.0]),
        };
        let hits = m.score(&query);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "near");
        assert_eq!(hits[1].id, "far");
    }
}
