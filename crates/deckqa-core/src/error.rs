use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed or empty corpus input. Fatal at startup.
    #[error("Corpus load failed: {0}")]
    CorpusLoad(String),

    /// Unknown chunk id. A programmer error, never user-facing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The embedding collaborator failed or timed out. Non-fatal: callers
    /// degrade to keyword-only scoring.
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),
}

pub type Result<T> = std::result::Result<T, Error>;
