//! Score fusion, matrix union and bounded recursive expansion.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use deckqa_core::config::RetrievalConfig;
use deckqa_core::matrix::{MatrixTable, Tier};
use deckqa_core::traits::{EmbeddingProvider, Matcher};
use deckqa_core::types::{Chunk, ChunkId, MatchSource, QueryContext, ScoredChunk};
use deckqa_core::{Error, Result};
use deckqa_index::{CorpusIndex, KeywordMatcher, SemanticMatcher};
use deckqa_matrix::{is_matrix_query, tiers_in_query};

/// The orchestrator's output for one query: the final chunk sequence in
/// rank order, the derived matrix table for tier/feature questions, and the
/// per-chunk scores for diagnostics. An empty `chunks` means "no relevant
/// content" and is a valid outcome callers must branch on.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub chunks: Vec<Chunk>,
    pub matrix: Option<MatrixTable>,
    pub scores: Vec<ScoredChunk>,
}

/// Runs the matching strategies over the shared index and merges their
/// rankings. Read-only over the index; safe to share across request
/// handlers.
pub struct Orchestrator {
    index: Arc<CorpusIndex>,
    keyword: KeywordMatcher,
    semantic: SemanticMatcher,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    cfg: RetrievalConfig,
}

impl Orchestrator {
    pub fn new(
        index: Arc<CorpusIndex>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        cfg: RetrievalConfig,
    ) -> Self {
        let keyword = KeywordMatcher::new(Arc::clone(&index), cfg.vocab_boost);
        let semantic = SemanticMatcher::new(Arc::clone(&index));
        Self { index, keyword, semantic, embedder, cfg }
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.cfg
    }

    /// Retrieve the chunks to hand the summarizer, deduplicated by id,
    /// ranked by combined score and capped at `max_results`.
    pub async fn retrieve(&self, query: &str) -> Result<Retrieval> {
        if self.index.is_empty() {
            return Ok(Retrieval { chunks: Vec::new(), matrix: None, scores: Vec::new() });
        }

        let ctx = QueryContext {
            text: query.to_string(),
            tokens: deckqa_index::tokenize::tokenize(query),
            embedding: self.query_embedding(query).await,
        };

        let mut merged: HashMap<ChunkId, ScoredChunk> = HashMap::new();
        merge_hits(&mut merged, self.keyword.score(&ctx), self.cfg.keyword_weight);
        merge_hits(&mut merged, self.semantic.score(&ctx), self.cfg.semantic_weight);

        // specialized pass for tier/feature comparison questions
        let matrix = if is_matrix_query(query) {
            let table = deckqa_matrix::analyze(self.index.chunks(), query);
            if let Some(table) = &table {
                self.union_matrix_sources(&mut merged, table)?;
            }
            table
        } else {
            None
        };

        let requested_tiers = tiers_in_query(query);
        self.expand(&ctx, &mut merged, matrix.as_ref(), &requested_tiers)?;

        let mut scores: Vec<ScoredChunk> = merged.into_values().collect();
        sort_ranked(&mut scores);
        scores.truncate(self.cfg.max_results);

        let chunks = scores
            .iter()
            .map(|s| self.index.get(&s.id).cloned())
            .collect::<Result<Vec<_>>>()?;

        debug!(query, results = chunks.len(), matrix = matrix.is_some(), "retrieval complete");
        Ok(Retrieval { chunks, matrix, scores })
    }

    /// Embed the query through the external provider, off the runtime and
    /// under a deadline. Any failure degrades to keyword-only scoring; with
    /// no provider or a vector-free corpus there is nothing to look up.
    async fn query_embedding(&self, query: &str) -> Option<Vec<f32>> {
        let provider = self.embedder.as_ref()?;
        if !self.index.has_embeddings() {
            return None;
        }
        match self.lookup_embedding(Arc::clone(provider), query).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                warn!("{e}; degrading to keyword-only scoring");
                None
            }
        }
    }

    async fn lookup_embedding(
        &self,
        provider: Arc<dyn EmbeddingProvider>,
        query: &str,
    ) -> Result<Vec<f32>> {
        let expected_dim = provider.dim();
        let text = query.to_string();
        let lookup = tokio::task::spawn_blocking(move || provider.embed(&text));
        match tokio::time::timeout(self.cfg.embed_timeout(), lookup).await {
            Ok(Ok(Ok(vector))) if vector.len() != expected_dim => {
                Err(Error::EmbeddingUnavailable(format!(
                    "provider returned {} dims, expected {expected_dim}",
                    vector.len()
                )))
            }
            Ok(Ok(Ok(vector))) => Ok(vector),
            Ok(Ok(Err(e))) => Err(Error::EmbeddingUnavailable(e.to_string())),
            Ok(Err(e)) => Err(Error::EmbeddingUnavailable(format!("lookup task failed: {e}"))),
            Err(_) => Err(Error::EmbeddingUnavailable(format!(
                "lookup timed out after {}ms",
                self.cfg.embed_timeout_ms
            ))),
        }
    }

    /// Chunks the matrix table was read from must survive ranking even when
    /// their keyword overlap is weak: grant them at least the configured
    /// score floor.
    fn union_matrix_sources(
        &self,
        merged: &mut HashMap<ChunkId, ScoredChunk>,
        table: &MatrixTable,
    ) -> Result<()> {
        for id in &table.source_ids {
            let chunk = self.index.get(id)?;
            let entry = merged.entry(id.clone()).or_insert_with(|| ScoredChunk {
                id: id.clone(),
                slide_number: chunk.slide_number,
                score: 0.0,
                matched_by: Default::default(),
            });
            entry.score = entry.score.max(self.cfg.matrix_score_floor);
            entry.matched_by.insert(MatchSource::Matrix);
        }
        Ok(())
    }

    /// Bounded follow-up retrieval: while the result set is below the
    /// sufficiency threshold, pull vocabulary terms out of the best partial
    /// result that were not searched yet and re-run the keyword matcher on
    /// them. Each pass must contribute previously-unseen chunk ids or the
    /// expansion stops early, which guarantees termination well before the
    /// depth cap.
    fn expand(
        &self,
        ctx: &QueryContext,
        merged: &mut HashMap<ChunkId, ScoredChunk>,
        matrix: Option<&MatrixTable>,
        requested_tiers: &[Tier],
    ) -> Result<()> {
        let mut visited: HashSet<ChunkId> = merged.keys().cloned().collect();
        let mut searched: HashSet<String> = ctx.tokens.iter().cloned().collect();

        for depth in 0..self.cfg.max_expansion_depth {
            if self.sufficient(merged, matrix, requested_tiers) {
                break;
            }
            let Some(best_id) = best_ranked(merged) else {
                break;
            };
            let best = self.index.get(&best_id)?;

            // vocabulary phrases in the best chunk we have not searched yet
            let follow_tokens: Vec<String> = deckqa_index::tokenize::vocab_phrases_in(&best.content)
                .iter()
                .flat_map(|phrase| phrase.split_whitespace())
                .filter(|t| !searched.contains(*t))
                .map(str::to_string)
                .collect();
            if follow_tokens.is_empty() {
                break;
            }
            searched.extend(follow_tokens.iter().cloned());

            let follow_ctx = QueryContext {
                text: follow_tokens.join(" "),
                tokens: follow_tokens,
                embedding: None,
            };
            let fresh: Vec<ScoredChunk> = self
                .keyword
                .score(&follow_ctx)
                .into_iter()
                .filter(|hit| !visited.contains(&hit.id))
                .collect();
            if fresh.is_empty() {
                debug!(depth, "expansion made no progress, stopping");
                break;
            }

            debug!(depth, added = fresh.len(), "recursive expansion pass");
            visited.extend(fresh.iter().map(|hit| hit.id.clone()));
            merge_hits(merged, fresh, self.cfg.keyword_weight);
        }
        Ok(())
    }

    fn sufficient(
        &self,
        merged: &HashMap<ChunkId, ScoredChunk>,
        matrix: Option<&MatrixTable>,
        requested_tiers: &[Tier],
    ) -> bool {
        if merged.len() < self.cfg.min_sufficient {
            return false;
        }
        // a comparison over N tiers needs at least N feature rows to say
        // anything useful
        if let Some(table) = matrix {
            if table.features.len() < requested_tiers.len() {
                return false;
            }
        }
        true
    }
}

fn merge_hits(merged: &mut HashMap<ChunkId, ScoredChunk>, hits: Vec<ScoredChunk>, weight: f32) {
    for hit in hits {
        match merged.get_mut(&hit.id) {
            Some(existing) => {
                existing.score += weight * hit.score;
                existing.matched_by.extend(hit.matched_by);
            }
            None => {
                let mut scored = hit;
                scored.score *= weight;
                merged.insert(scored.id.clone(), scored);
            }
        }
    }
}

/// Combined score descending, slide number ascending, id as the final
/// tie-break so the ordering is total and runs are reproducible.
fn sort_ranked(scores: &mut [ScoredChunk]) {
    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.slide_number.cmp(&b.slide_number))
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn best_ranked(merged: &HashMap<ChunkId, ScoredChunk>) -> Option<ChunkId> {
    let mut ranked: Vec<ScoredChunk> = merged.values().cloned().collect();
    sort_ranked(&mut ranked);
    ranked.first().map(|s| s.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, slide: u32, content: &str) -> Chunk {
        Chunk {
            id: id.into(),
            title: String::new(),
            slide_number: slide,
            content: content.into(),
            source_file: "deck.pptx".into(),
            embedding: None,
        }
    }

    fn orchestrator(chunks: Vec<Chunk>) -> Orchestrator {
        let index = Arc::new(CorpusIndex::load(chunks).unwrap());
        Orchestrator::new(index, None, RetrievalConfig::default())
    }

    #[tokio::test]
    async fn no_overlap_yields_empty_not_error() {
        let o = orchestrator(vec![chunk("c1", 1, "completely unrelated prose")]);
        let r = o.retrieve("quantum entanglement basics").await.unwrap();
        assert!(r.chunks.is_empty());
        assert!(r.matrix.is_none());
    }

    #[tokio::test]
    async fn retrieve_is_idempotent() {
        let o = orchestrator(vec![
            chunk("c1", 1, "virtual agent overview and workflow notes"),
            chunk("c2", 2, "workflow automation details"),
            chunk("c3", 3, "virtual agent deep dive"),
        ]);
        let a = o.retrieve("virtual agent workflow").await.unwrap();
        let b = o.retrieve("virtual agent workflow").await.unwrap();
        let ids = |r: &Retrieval| r.chunks.iter().map(|c| c.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        assert!(!a.chunks.is_empty());
    }

    #[tokio::test]
    async fn matrix_sources_get_the_score_floor() {
        let o = orchestrator(vec![
            // heavy keyword overlap but no matrix shape
            chunk("wordy", 1, "standard standard standard include include include tier"),
            // the actual grid, light on query words
            chunk("grid", 2, "AI Search: Standard ✗, Enterprise ✓"),
        ]);
        let r = o.retrieve("does standard include ai search").await.unwrap();
        let grid_score = r.scores.iter().find(|s| s.id == "grid").unwrap();
        assert!(grid_score.matched_by.contains(&MatchSource::Matrix));
        assert!(grid_score.score >= o.config().matrix_score_floor);
        assert!(r.matrix.is_some());
    }

    #[tokio::test]
    async fn expansion_pulls_in_referenced_chunks() {
        // the only direct hit mentions predictive intelligence, which the
        // query never named; the follow-up pass should surface the chunk
        // that discusses it
        let o = orchestrator(vec![
            chunk("hub", 1, "Now Assist summary, see Predictive Intelligence notes"),
            chunk("spoke", 7, "Predictive Intelligence model tuning details"),
        ]);
        let r = o.retrieve("now assist").await.unwrap();
        let ids: Vec<_> = r.chunks.iter().map(|c| c.id.as_str()).collect();
        assert!(ids.contains(&"hub"));
        assert!(ids.contains(&"spoke"));
    }

    #[tokio::test]
    async fn expansion_terminates_without_progress() {
        // expansion terms resolve only to already-seen ids; the loop must
        // stop early rather than spin to the depth cap
        let o = orchestrator(vec![chunk("only", 1, "virtual agent and ai search together")]);
        let r = o.retrieve("virtual agent").await.unwrap();
        assert_eq!(r.chunks.len(), 1);
    }
}
