//! deckqa-index
//!
//! In-memory corpus index over slide chunks: keyword postings plus an
//! embedding table, with the keyword and semantic matchers that score
//! against it. Everything here is read-only after `CorpusIndex::load`.

pub mod corpus;
pub mod keyword;
pub mod semantic;
pub mod tokenize;

pub use corpus::CorpusIndex;
pub use keyword::KeywordMatcher;
pub use semantic::{cosine_similarity, SemanticMatcher};
