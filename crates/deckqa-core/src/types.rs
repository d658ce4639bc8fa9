//! Domain types shared by the index, matchers and the retrieval facade.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type ChunkId = String;

/// One slide-derived unit of corpus content.
///
/// - `id`: globally unique chunk identifier (e.g. "chunk_005")
/// - `title`: slide title as extracted
/// - `slide_number`: position in the source deck, used for stable tie-breaks
/// - `content`: the text payload of the chunk
/// - `source_file`: the deck the chunk was extracted from
/// - `embedding`: optional precomputed dense vector, absent for
///   keyword-only corpora
///
/// Chunks are created once at corpus load and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub title: String,
    pub slide_number: u32,
    pub content: String,
    pub source_file: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// First `max` characters of the content, for display surfaces.
    #[must_use]
    pub fn preview(&self, max: usize) -> String {
        if self.content.len() <= max {
            return self.content.clone();
        }
        let mut end = max;
        while !self.content.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &self.content[..end])
    }
}

/// Indicates which strategy produced (or contributed to) a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchSource {
    Keyword,
    Semantic,
    Matrix,
}

/// The minimal surface returned by all matchers.
///
/// `id` matches `Chunk::id` and must resolve into the corpus. `score` is
/// normalized so that higher is always better and strategies are
/// commensurable. `slide_number` is carried for deterministic tie-breaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: ChunkId,
    pub slide_number: u32,
    pub score: f32,
    pub matched_by: BTreeSet<MatchSource>,
}

impl ScoredChunk {
    #[must_use]
    pub fn new(id: ChunkId, slide_number: u32, score: f32, source: MatchSource) -> Self {
        let mut matched_by = BTreeSet::new();
        matched_by.insert(source);
        Self { id, slide_number, score, matched_by }
    }
}

/// A query in the shape matchers consume: raw text, index-identical tokens
/// and an optional embedding of the text.
///
/// The embedding is filled in by the orchestrator when the external provider
/// answers within its deadline; matchers that need it treat `None` as
/// "unavailable", never as an error.
#[derive(Debug, Clone, Default)]
pub struct QueryContext {
    pub text: String,
    pub tokens: Vec<String>,
    pub embedding: Option<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_short_content_is_verbatim() {
        let c = Chunk {
            id: "c1".into(),
            title: "t".into(),
            slide_number: 1,
            content: "short".into(),
            source_file: "deck.pptx".into(),
            embedding: None,
        };
        assert_eq!(c.preview(200), "short");
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let c = Chunk {
            id: "c1".into(),
            title: "t".into(),
            slide_number: 1,
            content: "ab✓cd".into(),
            source_file: "deck.pptx".into(),
            embedding: None,
        };
        // index 3 falls inside the multi-byte check mark
        assert_eq!(c.preview(3), "ab...");
    }

    #[test]
    fn scored_chunk_records_its_source() {
        let s = ScoredChunk::new("c1".into(), 3, 0.5, MatchSource::Keyword);
        assert!(s.matched_by.contains(&MatchSource::Keyword));
        assert!(!s.matched_by.contains(&MatchSource::Semantic));
    }
}
