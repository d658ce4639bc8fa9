//! deckqa-retrieval
//!
//! Combines the keyword and semantic matchers with the license matrix
//! analyzer, expands retrieval recursively when the first pass comes back
//! thin, and fronts the whole thing with the cached `answer_query` facade
//! that the web/CLI layer calls.

pub mod orchestrator;
pub mod service;

pub use orchestrator::{Orchestrator, Retrieval};
pub use service::{Answer, QueryService, Summarizer};
