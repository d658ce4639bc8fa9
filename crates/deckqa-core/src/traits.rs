use crate::types::{MatchSource, QueryContext, ScoredChunk};

/// A scoring strategy over the shared corpus index. Strategies are
/// stateless after construction and safe to share across request handlers.
pub trait Matcher: Send + Sync {
    fn source(&self) -> MatchSource;

    /// Score the corpus against the query. Returns only chunks with
    /// score > 0, ties broken by ascending slide number. A strategy whose
    /// inputs are unavailable (e.g. no embedding) returns an empty vec.
    fn score(&self, query: &QueryContext) -> Vec<ScoredChunk>;
}

/// External collaborator that turns query text into a dense vector.
///
/// Implementations may block on network I/O; the orchestrator calls this
/// off the async runtime with a deadline and treats failure as
/// "semantic scoring unavailable".
pub trait EmbeddingProvider: Send + Sync {
    fn dim(&self) -> usize;
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}
