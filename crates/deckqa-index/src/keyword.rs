//! Weighted term-overlap scoring against the corpus postings.

use std::collections::HashMap;
use std::sync::Arc;

use deckqa_core::traits::Matcher;
use deckqa_core::types::{MatchSource, QueryContext, ScoredChunk};

use crate::corpus::CorpusIndex;
use crate::tokenize::is_vocab_token;

/// Scores chunks by weighted term-frequency overlap with the query.
///
/// Tokens from the domain vocabulary carry `vocab_boost` weight, everything
/// else weight 1. Raw scores are normalized against the best raw overlap
/// for the query so the result lands in (0, 1] and fuses cleanly with
/// cosine scores.
pub struct KeywordMatcher {
    index: Arc<CorpusIndex>,
    vocab_boost: f32,
}

impl KeywordMatcher {
    pub fn new(index: Arc<CorpusIndex>, vocab_boost: f32) -> Self {
        Self { index, vocab_boost }
    }
}

impl Matcher for KeywordMatcher {
    fn source(&self) -> MatchSource {
        MatchSource::Keyword
    }

    fn score(&self, query: &QueryContext) -> Vec<ScoredChunk> {
        // distinct query tokens; repeating a word in the question must not
        // double its weight
        let mut tokens: Vec<&str> = query.tokens.iter().map(String::as_str).collect();
        tokens.sort_unstable();
        tokens.dedup();
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut raw: HashMap<usize, f32> = HashMap::new();
        for token in tokens {
            let weight = if is_vocab_token(token) { self.vocab_boost } else { 1.0 };
            for posting in self.index.postings(token) {
                *raw.entry(posting.ordinal).or_insert(0.0) += weight * posting.tf as f32;
            }
        }

        let max_raw = raw.values().fold(0.0f32, |acc, &v| acc.max(v));
        if max_raw <= 0.0 {
            return Vec::new();
        }

        let mut hits: Vec<ScoredChunk> = raw
            .into_iter()
            .map(|(ordinal, score)| {
                let chunk = self.index.chunk_at(ordinal);
                ScoredChunk::new(
                    chunk.id.clone(),
                    chunk.slide_number,
                    score / max_raw,
                    MatchSource::Keyword,
                )
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
