//! Lexical detection: is this a tier/feature comparison question, which
//! tiers and feature does it name?

use deckqa_core::matrix::Tier;

/// Terms signalling the question is about licensing at all.
const LICENSE_TERMS: &[&str] = &["license", "licensing", "licenses", "tier", "tiers", "edition", "editions", "plan", "plans"];

/// Terms signalling a comparison or availability question.
const COMPARISON_TERMS: &[&str] = &[
    "compare", "comparison", "difference", "differences", "differ", "different", "versus",
    "vs", "between", "include", "includes", "included", "available", "availability",
    "support", "supports", "offer", "offers",
];

/// Feature phrases recognized in queries, checked in order.
pub const FEATURES: &[&str] = &[
    "virtual agent",
    "now assist",
    "predictive intelligence",
    "performance analytics",
    "ai search",
    "knowledge graph",
    "service portal",
    "workflow",
    "chatbot",
    "automation",
    "cmdb",
];

/// Alternate spellings the deck and askers use for the same feature.
const FEATURE_ALIASES: &[(&str, &[&str])] = &[
    ("virtual agent", &["va", "chatbot", "chat bot", "conversational bot"]),
    ("now assist", &["gen ai", "generative ai", "llm"]),
    ("predictive intelligence", &["prediction", "machine learning", "ml"]),
    ("performance analytics", &["analytics", "reporting"]),
];

/// Substring search constrained to word boundaries, so "pro" never fires
/// inside "professional" or "approved". '+' counts as part of a word on the
/// right edge because of the "pro+" tier spelling.
pub(crate) fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let abs = start + pos;
        let before_ok = haystack[..abs]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let end = abs + needle.len();
        let after_ok = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric() && c != '+');
        if before_ok && after_ok {
            return true;
        }
        start = abs + needle.len().max(1);
    }
    false
}

/// First tier alias found in `text` at a word boundary, longest alias first
/// so "professional plus" wins over "professional".
pub(crate) fn find_tier(text: &str) -> Option<Tier> {
    let lower = text.to_lowercase();
    Tier::ALIASES
        .iter()
        .find(|(alias, _)| contains_word(&lower, alias))
        .map(|(_, tier)| *tier)
}

/// Every tier the query names, in ladder order, deduplicated.
pub fn tiers_in_query(query: &str) -> Vec<Tier> {
    let lower = query.to_lowercase();
    let mut tiers: Vec<Tier> = Tier::ALIASES
        .iter()
        .filter(|(alias, _)| contains_word(&lower, alias))
        .map(|(_, tier)| *tier)
        .collect();
    tiers.sort_unstable();
    tiers.dedup();
    tiers
}

/// True when the query reads like a tier/feature comparison question:
/// it names a tier (or a licensing term) and uses a comparison or
/// availability word.
pub fn is_matrix_query(query: &str) -> bool {
    let lower = query.to_lowercase();
    let about_licensing = !tiers_in_query(query).is_empty()
        || LICENSE_TERMS.iter().any(|t| contains_word(&lower, t));
    let comparing = COMPARISON_TERMS.iter().any(|t| contains_word(&lower, t));
    about_licensing && comparing
}

/// The first known feature the query mentions, canonical spelling.
pub fn feature_in_query(query: &str) -> Option<&'static str> {
    let lower = query.to_lowercase();
    if let Some(feature) = FEATURES.iter().find(|f| contains_word(&lower, f)) {
        return Some(feature);
    }
    FEATURE_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|a| contains_word(&lower, a)))
        .map(|(canonical, _)| *canonical)
}

/// Whether two feature spellings refer to the same feature: substring
/// containment either way, or membership in the same alias group.
pub fn matches_feature(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.contains(&b) || b.contains(&a) {
        return true;
    }
    FEATURE_ALIASES.iter().any(|(canonical, aliases)| {
        let in_group = |s: &str| s == *canonical || aliases.contains(&s);
        in_group(&a) && in_group(&b)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_boundaries_protect_short_aliases() {
        assert!(!contains_word("approved workflows", "pro"));
        assert!(contains_word("the pro tier", "pro"));
        assert!(!contains_word("pro+ tier", "pro"));
        assert!(contains_word("pro+ tier", "pro+"));
    }

    #[test]
    fn tier_detection_prefers_longest_alias() {
        assert_eq!(find_tier("Professional Plus ✓"), Some(Tier::ProfessionalPlus));
        assert_eq!(find_tier("Professional ✓"), Some(Tier::Professional));
        assert_eq!(find_tier("no tier here"), None);
    }

    #[test]
    fn tiers_in_query_come_back_in_ladder_order() {
        let tiers = tiers_in_query("enterprise versus standard versus pro");
        assert_eq!(tiers, vec![Tier::Standard, Tier::Professional, Tier::Enterprise]);
    }

    #[test]
    fn availability_question_is_a_matrix_query() {
        assert!(is_matrix_query("Does Standard license include Predictive Intelligence?"));
        assert!(is_matrix_query("compare Pro and Enterprise tiers"));
        assert!(!is_matrix_query("what is a virtual agent"));
        assert!(!is_matrix_query("tell me about the roadmap"));
    }

    #[test]
    fn feature_detection_uses_aliases() {
        assert_eq!(feature_in_query("is the chatbot included?"), Some("virtual agent"));
        assert_eq!(
            feature_in_query("predictive intelligence availability"),
            Some("predictive intelligence")
        );
        assert_eq!(feature_in_query("pricing details"), None);
    }

    #[test]
    fn feature_matching_crosses_alias_groups() {
        assert!(matches_feature("virtual agent", "chatbot"));
        assert!(matches_feature("Predictive Intelligence", "ml"));
        assert!(matches_feature("virtual agent", "virtual agent topics"));
        assert!(!matches_feature("virtual agent", "performance analytics"));
    }
}
