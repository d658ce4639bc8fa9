//! The caller-facing facade: cache-wrapped retrieval plus the outbound
//! summarization boundary.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use deckqa_cache::QueryCache;
use deckqa_core::config::{CacheConfig, RetrievalConfig};
use deckqa_core::matrix::MatrixTable;
use deckqa_core::traits::EmbeddingProvider;
use deckqa_core::types::Chunk;
use deckqa_core::Result;
use deckqa_index::CorpusIndex;

use crate::orchestrator::Orchestrator;

/// Outbound boundary to the text-generation collaborator. The core hands
/// over the query, the ranked chunks and the matrix table when one was
/// derived, and takes back opaque text it never inspects.
pub trait Summarizer: Send + Sync {
    fn summarize(
        &self,
        query: &str,
        chunks: &[Chunk],
        matrix: Option<&MatrixTable>,
    ) -> anyhow::Result<String>;
}

/// What `answer_query` returns to the web/CLI layer. An empty
/// `summary_input` means no relevant content was found; callers must branch
/// on it rather than summarizing nothing.
#[derive(Debug, Clone)]
pub struct Answer {
    pub summary_input: Vec<Chunk>,
    pub matrix: Option<MatrixTable>,
    pub cached: bool,
    pub elapsed: Duration,
}

#[derive(Clone)]
struct CachedResult {
    chunks: Vec<Chunk>,
    matrix: Option<MatrixTable>,
}

/// The sole entry point the front end calls: orchestrated retrieval behind
/// the TTL query cache.
pub struct QueryService {
    orchestrator: Orchestrator,
    cache: QueryCache<CachedResult>,
}

impl QueryService {
    pub fn new(
        index: Arc<CorpusIndex>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
        retrieval: RetrievalConfig,
        cache: CacheConfig,
    ) -> Self {
        info!(
            chunks = index.len(),
            embeddings = index.embedding_count(),
            ttl_s = cache.ttl_seconds,
            "query service ready"
        );
        let cache = QueryCache::new(cache.ttl(), retrieval.fingerprint());
        let orchestrator = Orchestrator::new(index, embedder, retrieval);
        Self { orchestrator, cache }
    }

    /// Answer a deck question. `bypass_cache` forces a fresh retrieval and
    /// refreshes the cached entry.
    pub async fn answer_query(&self, query: &str, bypass_cache: bool) -> Result<Answer> {
        let started = std::time::Instant::now();
        let (result, cached) = self
            .cache
            .get_or_compute(query, bypass_cache, || async {
                let retrieval = self.orchestrator.retrieve(query).await?;
                Ok(CachedResult { chunks: retrieval.chunks, matrix: retrieval.matrix })
            })
            .await?;

        Ok(Answer {
            summary_input: result.chunks,
            matrix: result.matrix,
            cached,
            elapsed: started.elapsed(),
        })
    }

    /// Drop the cached entry for one query.
    pub async fn invalidate(&self, query: &str) {
        self.cache.invalidate(query).await;
    }

    /// Drop every cached entry.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}
