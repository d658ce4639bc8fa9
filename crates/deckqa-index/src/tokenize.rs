//! Query/content tokenization and the fixed domain vocabulary.
//!
//! Indexing and querying must tokenize identically or postings lookups
//! silently miss; both go through [`tokenize`].

/// Stop words removed from both index postings and query tokens.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
    "it", "its", "of", "on", "that", "the", "to", "was", "will", "with", "or", "but", "not",
    "this", "these", "they", "them", "their", "there", "then", "than", "so", "if", "when",
    "where", "why", "how", "what", "which", "who", "whom", "whose", "can", "could", "should",
    "would", "may", "might", "must", "shall", "do", "does", "did", "have", "had", "having",
];

/// Product, feature and tier names that anchor deck questions. Query tokens
/// drawn from these phrases get the configured multiplier boost, which is
/// what ranks a chunk mentioning "Enterprise Virtual Agent" above one with
/// incidental word overlap.
pub const DOMAIN_VOCAB: &[&str] = &[
    // license tiers
    "standard",
    "professional",
    "professional plus",
    "pro",
    "pro+",
    "enterprise",
    // product lines
    "itsm",
    "itom",
    "itbm",
    "csm",
    "csx",
    "hrsd",
    // features
    "virtual agent",
    "now assist",
    "predictive intelligence",
    "performance analytics",
    "ai search",
    "knowledge graph",
    "workflow",
    "chatbot",
    "automation",
    "cmdb",
    "service portal",
];

/// Case-fold and split on non-alphanumeric boundaries, dropping stop words.
/// '+' is kept inside tokens so "pro+" survives as a tier spelling.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '+'))
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Whether `token` occurs in any vocabulary phrase ("agent" does, via
/// "virtual agent").
pub fn is_vocab_token(token: &str) -> bool {
    DOMAIN_VOCAB
        .iter()
        .flat_map(|phrase| phrase.split_whitespace())
        .any(|t| t == token)
}

/// Vocabulary phrases present in `text`, in the fixed vocabulary order.
/// Deterministic by construction, which keeps recursive expansion stable.
pub fn vocab_phrases_in(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    DOMAIN_VOCAB
        .iter()
        .filter(|phrase| lower.contains(*phrase))
        .copied()
        .collect()
}
