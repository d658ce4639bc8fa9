//! Corpus loading and the in-memory index shared by every matcher.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use deckqa_core::error::{Error, Result};
use deckqa_core::types::{Chunk, ChunkId};

use crate::tokenize::tokenize;

/// One postings entry: a chunk ordinal plus how often the token occurs in
/// that chunk (title and body combined).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub ordinal: usize,
    pub tf: u32,
}

/// Read-only index over the chunk corpus: the chunks in slide order,
/// keyword postings (token -> postings list) and, when the extraction
/// collaborator supplied embeddings, per-chunk dense vectors. Built once at
/// startup, then shared by reference; nothing here mutates after `load`.
#[derive(Debug)]
pub struct CorpusIndex {
    chunks: Vec<Chunk>,
    by_id: HashMap<ChunkId, usize>,
    postings: HashMap<String, Vec<Posting>>,
    embedding_count: usize,
}

impl CorpusIndex {
    /// Build the index from chunks in slide order.
    ///
    /// Fails `CorpusLoad` on an empty corpus or a duplicate chunk id; both
    /// indicate broken extraction output and are fatal at startup.
    pub fn load(chunks: Vec<Chunk>) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::CorpusLoad("corpus contains no chunks".into()));
        }

        let mut by_id = HashMap::with_capacity(chunks.len());
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        let mut embedding_count = 0;

        for (ordinal, chunk) in chunks.iter().enumerate() {
            if by_id.insert(chunk.id.clone(), ordinal).is_some() {
                return Err(Error::CorpusLoad(format!("duplicate chunk id: {}", chunk.id)));
            }
            // title tokens participate in postings alongside the body
            for token in tokenize(&chunk.title).into_iter().chain(tokenize(&chunk.content)) {
                let list = postings.entry(token).or_default();
                match list.last_mut() {
                    Some(last) if last.ordinal == ordinal => last.tf += 1,
                    _ => list.push(Posting { ordinal, tf: 1 }),
                }
            }
            if chunk.embedding.is_some() {
                embedding_count += 1;
            }
        }

        info!(
            chunks = chunks.len(),
            tokens = postings.len(),
            embeddings = embedding_count,
            "corpus index built"
        );
        Ok(Self { chunks, by_id, postings, embedding_count })
    }

    /// Load the corpus JSON produced by the extraction collaborator: a
    /// top-level array of chunk records.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::CorpusLoad(format!("{}: {}", path.display(), e)))?;
        let chunks: Vec<Chunk> = serde_json::from_str(&raw)
            .map_err(|e| Error::CorpusLoad(format!("{}: {}", path.display(), e)))?;
        Self::load(chunks)
    }

    pub fn get(&self, id: &str) -> Result<&Chunk> {
        self.by_id
            .get(id)
            .map(|&ordinal| &self.chunks[ordinal])
            .ok_or_else(|| Error::NotFound(format!("chunk id {id}")))
    }

    pub fn chunk_at(&self, ordinal: usize) -> &Chunk {
        &self.chunks[ordinal]
    }

    /// Postings for `token`, ascending by ordinal. Empty for unknown tokens.
    pub fn postings(&self, token: &str) -> &[Posting] {
        self.postings.get(token).map_or(&[], Vec::as_slice)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Whether any chunk carries an embedding; the semantic matcher is a
    /// no-op without them.
    pub fn has_embeddings(&self) -> bool {
        self.embedding_count > 0
    }

    pub fn embedding_count(&self) -> usize {
        self.embedding_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, slide: u32, content: &str) -> Chunk {
        Chunk {
            id: id.into(),
            title: format!("Slide {slide}"),
            slide_number: slide,
            content: content.into(),
            source_file: "deck.pptx".into(),
            embedding: None,
        }
    }

    #[test]
    fn load_rejects_empty_corpus() {
        let err = CorpusIndex::load(vec![]).unwrap_err();
        assert!(matches!(err, Error::CorpusLoad(_)));
    }

    #[test]
    fn load_rejects_duplicate_ids() {
        let err = CorpusIndex::load(vec![
            chunk("c1", 1, "alpha"),
            chunk("c1", 2, "bravo"),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::CorpusLoad(_)));
    }

    #[test]
    fn get_unknown_id_is_not_found() {
        let index = CorpusIndex::load(vec![chunk("c1", 1, "alpha")]).unwrap();
        assert!(matches!(index.get("missing"), Err(Error::NotFound(_))));
        assert_eq!(index.get("c1").unwrap().slide_number, 1);
    }

    #[test]
    fn postings_accumulate_term_frequency() {
        let index = CorpusIndex::load(vec![
            chunk("c1", 1, "Virtual Agent loves the virtual world"),
            chunk("c2", 2, "nothing relevant"),
        ])
        .unwrap();
        assert_eq!(index.postings("virtual"), &[Posting { ordinal: 0, tf: 2 }]);
        assert!(index.postings("unknown-token").is_empty());
    }

    #[test]
    fn load_counts_embeddings() {
        let mut with_vec = chunk("c1", 1, "alpha");
        with_vec.embedding = Some(vec![0.1, 0.2]);
        let index = CorpusIndex::load(vec![with_vec, chunk("c2", 2, "bravo")]).unwrap();
        assert!(index.has_embeddings());
        assert_eq!(index.embedding_count(), 1);
    }
}
