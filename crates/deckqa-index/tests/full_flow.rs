use std::path::PathBuf;
use std::sync::Arc;

use deckqa_core::traits::Matcher;
use deckqa_core::types::QueryContext;
use deckqa_index::tokenize::tokenize;
use deckqa_index::{CorpusIndex, KeywordMatcher};

fn sample_corpus_path() -> PathBuf {
    // crates/deckqa-index -> crates -> repo root
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .unwrap()
        .to_path_buf();
    root.join("test_data/corpus.json")
}

fn query(text: &str) -> QueryContext {
    QueryContext { text: text.into(), tokens: tokenize(text), embedding: None }
}

#[test]
fn sample_corpus_full_flow() {
    let index = Arc::new(CorpusIndex::from_json_file(&sample_corpus_path()).expect("load"));
    assert_eq!(index.len(), 5);
    assert_eq!(index.embedding_count(), 0);

    // postings reach both the grid slide and the licensing slide
    let virtual_postings = index.postings("virtual");
    assert!(virtual_postings.len() >= 2);

    let chunk = index.get("chunk_005").expect("known id");
    assert_eq!(chunk.slide_number, 5);
    assert!(index.get("chunk_999").is_err());

    let matcher = KeywordMatcher::new(Arc::clone(&index), 3.0);
    for q in ["predictive intelligence", "virtual agent", "performance analytics"] {
        let hits = matcher.score(&query(q));
        assert!(!hits.is_empty(), "no hits for '{q}'");
        if hits.len() >= 2 {
            assert!(hits[0].score >= hits[1].score);
        }
    }

    // deck terminology must outrank the workplace chunk for deck questions
    let hits = matcher.score(&query("Does Standard license include Predictive Intelligence?"));
    assert!(hits.iter().all(|h| h.id != "chunk_004"));
    assert_eq!(hits[0].id, "chunk_005");
}

#[test]
fn malformed_corpus_file_is_a_load_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("corpus.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = CorpusIndex::from_json_file(&path).unwrap_err();
    assert!(matches!(err, deckqa_core::Error::CorpusLoad(_)));
}

#[test]
fn missing_corpus_file_is_a_load_error() {
    let err = CorpusIndex::from_json_file(std::path::Path::new("/nonexistent/corpus.json"))
        .unwrap_err();
    assert!(matches!(err, deckqa_core::Error::CorpusLoad(_)));
}
