//! deckqa-matrix
//!
//! License matrix analysis: detects tier/feature comparison questions,
//! locates matrix-shaped chunks, parses them into a [`MatrixTable`] and
//! applies the cumulative-tier inference rule. Parsing is tolerant; a line
//! that cannot be read drops with a recorded warning, never a failure.

pub mod detect;
pub mod infer;
pub mod parse;

pub use detect::{feature_in_query, is_matrix_query, matches_feature, tiers_in_query};
pub use parse::find_matrix_chunks;

use deckqa_core::matrix::MatrixTable;
use deckqa_core::types::Chunk;

/// Full analysis pass over the corpus for one query: locate matrix-shaped
/// chunks, parse them into a single table, infer across the tier ladder and
/// project to the tiers the query names. `None` when the corpus holds no
/// readable matrix content.
pub fn analyze(chunks: &[Chunk], query: &str) -> Option<MatrixTable> {
    let sources = find_matrix_chunks(chunks);
    if sources.is_empty() {
        return None;
    }
    let mut table = parse::parse_chunks(&sources);
    if table.is_empty() {
        return None;
    }
    infer::apply_cumulative_inference(&mut table);
    table.project(&tiers_in_query(query));

    // rows for the feature the query asks about come first, matched through
    // the alias table so "chatbot" finds the Virtual Agent row
    if let Some(asked) = feature_in_query(query) {
        let (mut matched, rest): (Vec<String>, Vec<String>) = table
            .features
            .drain(..)
            .partition(|row| matches_feature(asked, row.as_str()));
        matched.extend(rest);
        table.features = matched;
    }
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckqa_core::matrix::Tier;

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

    #[test]
    fn analyze_merges_grid_and_bullet_chunks() {
        let chunks = vec![
            chunk("c1", 1, "Professional includes:\n- Virtual Agent\n- Performance Analytics"),
            chunk(
                "c2",
                2,
                "Virtual Agent: Standard ✗, Professional ✓, Enterprise ✓\n\
                 Predictive Intelligence: Standard ✗, Enterprise ✓",
            ),
        ];
        let table = analyze(&chunks, "compare license tiers").unwrap();
        assert!(table.source_ids.contains(&"c1".to_string()));
        assert!(table.source_ids.contains(&"c2".to_string()));
        assert_eq!(table.is_available("performance analytics", Tier::Professional), Some(true));
        assert_eq!(table.is_available("predictive intelligence", Tier::Standard), Some(false));
    }

    #[test]
    fn analyze_projects_to_queried_tiers() {
        let chunks = vec![chunk(
            "c1",
            1,
            "Predictive Intelligence: Standard ✗, Enterprise ✓",
        )];
        let table = analyze(&chunks, "does standard include predictive intelligence").unwrap();
        assert_eq!(table.tiers, vec![Tier::Standard]);
        assert_eq!(table.is_available("predictive intelligence", Tier::Standard), Some(false));
    }

    #[test]
    fn analyze_without_matrix_content_is_none() {
        let chunks = vec![chunk("c1", 1, "general prose about the product")];
        assert!(analyze(&chunks, "compare tiers").is_none());
    }

    #[test]
    fn asked_feature_rows_come_first_via_aliases() {
        let chunks = vec![chunk(
            "c1",
            1,
            "Performance Analytics: Standard ✗, Enterprise ✓\n\
             Virtual Agent: Standard ✗, Enterprise ✓",
        )];
        let table = analyze(&chunks, "is the chatbot included in enterprise").unwrap();
        assert_eq!(table.features[0], "virtual agent");
    }
}
