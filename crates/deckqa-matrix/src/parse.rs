//! Tolerant parsing of matrix-shaped chunk content.
//!
//! Two shapes are recognized:
//! - grid rows: `Feature: TierA <mark>, TierB <mark>, ...`
//! - tier bullet groups: a `<Tier> includes:` header followed by `- feature`
//!   lines (or an inline comma-separated feature list after the colon)
//!
//! A line that looks like a matrix row but yields no readable cell is
//! dropped with a recorded warning; partial tables are valid output.

use tracing::warn;

use deckqa_core::matrix::{Availability, MatrixTable, Tier};
use deckqa_core::types::Chunk;

use crate::detect::{contains_word, find_tier};

/// Positive availability indicators, checked after the negative ones so
/// "not included" never reads as "included".
const POSITIVE_MARKS: &[&str] = &["included", "includes", "available", "yes", "y", "x", "true"];
const POSITIVE_SYMBOLS: &[&str] = &["✓", "✔", "✅"];

/// Negative indicators; "add-on" counts as not included by default, the
/// deck uses it for separately purchased capabilities.
const NEGATIVE_MARKS: &[&str] = &["not included", "not available", "no", "n", "-", "false", "add-on", "addon"];
const NEGATIVE_SYMBOLS: &[&str] = &["✗", "✘", "✕", "×"];

/// Chunks whose content encodes a tier/feature grid in either shape.
pub fn find_matrix_chunks(chunks: &[Chunk]) -> Vec<&Chunk> {
    chunks
        .iter()
        .filter(|chunk| {
            chunk
                .content
                .lines()
                .any(|line| grid_row(line).is_some() || tier_header(line).is_some())
        })
        .collect()
}

/// Parse every given chunk into one merged table. Later chunks overwrite
/// earlier explicit marks for the same cell, so slide order decides
/// conflicts deterministically.
pub fn parse_chunks(chunks: &[&Chunk]) -> MatrixTable {
    let mut table = MatrixTable::new();
    for chunk in chunks {
        let mut contributed = false;
        // tier whose bullet list we are inside, if any
        let mut bullet_tier: Option<Tier> = None;

        for line in chunk.content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                bullet_tier = None;
                continue;
            }

            if let Some((feature, cells)) = grid_row(trimmed) {
                bullet_tier = None;
                if parse_grid_cells(&feature, cells, &mut table, &chunk.id) {
                    contributed = true;
                }
                continue;
            }

            if let Some((tier, inline)) = tier_header(trimmed) {
                bullet_tier = Some(tier);
                for feature in inline {
                    table.set(&feature, tier, Availability::Explicit(true));
                    contributed = true;
                }
                continue;
            }

            if let Some(feature) = bullet_item(trimmed) {
                if let Some(tier) = bullet_tier {
                    table.set(&feature, tier, Availability::Explicit(true));
                    contributed = true;
                }
                continue;
            }

            // prose line: ends any bullet group
            bullet_tier = None;
        }

        if contributed {
            table.source_ids.push(chunk.id.clone());
        }
    }
    table
}

/// `Feature: TierA <mark>, ...` candidate: a colon with at least one tier
/// alias on the right-hand side.
pub(crate) fn grid_row(line: &str) -> Option<(String, &str)> {
    let (feature, cells) = line.split_once(':')?;
    let feature = feature.trim();
    if feature.is_empty() || find_tier(cells).is_none() {
        return None;
    }
    Some((feature.to_lowercase(), cells))
}

/// `<Tier> includes:` header; returns the tier plus any features listed
/// inline after the colon.
pub(crate) fn tier_header(line: &str) -> Option<(Tier, Vec<String>)> {
    let lower = line.to_lowercase();
    let mentions_include = contains_word(&lower, "includes")
        || contains_word(&lower, "include")
        || lower.contains("available in");
    if !mentions_include {
        return None;
    }
    let (head, rest) = match line.split_once(':') {
        Some((head, rest)) => (head, rest),
        None => (line, ""),
    };
    let tier = find_tier(head)?;
    // a grid row would have put the tier on the right of the colon
    if find_tier(rest).is_some() {
        return None;
    }
    let inline = rest
        .split(',')
        .map(|f| f.trim().to_lowercase())
        .filter(|f| !f.is_empty())
        .collect();
    Some((tier, inline))
}

fn bullet_item(line: &str) -> Option<String> {
    let rest = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("• "))
        .or_else(|| line.strip_prefix("* "))?;
    let feature = rest.trim().trim_end_matches(['.', ';']).to_lowercase();
    (!feature.is_empty()).then_some(feature)
}

/// Parse the cell list of one grid row into the table. Returns whether any
/// cell was readable; an entirely unreadable row is dropped with a warning.
fn parse_grid_cells(feature: &str, cells: &str, table: &mut MatrixTable, chunk_id: &str) -> bool {
    let mut parsed_any = false;
    for cell in cells.split(',') {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        let Some(tier) = find_tier(cell) else {
            continue;
        };
        match read_mark(cell) {
            Some(available) => {
                table.set(feature, tier, Availability::Explicit(available));
                parsed_any = true;
            }
            None => {
                let msg = format!("unreadable mark for '{feature}' / {} in {chunk_id}: {cell}", tier.name());
                warn!("{msg}");
                table.warnings.push(msg);
            }
        }
    }
    if !parsed_any {
        let msg = format!("dropped unparseable matrix line for '{feature}' in {chunk_id}");
        warn!("{msg}");
        table.warnings.push(msg);
    }
    parsed_any
}

/// Interpret one cell's availability mark. Negative indicators are checked
/// first; `None` when no indicator is present.
fn read_mark(cell: &str) -> Option<bool> {
    let lower = cell.to_lowercase();
    if NEGATIVE_SYMBOLS.iter().any(|s| lower.contains(s))
        || NEGATIVE_MARKS.iter().any(|m| contains_word(&lower, m))
    {
        return Some(false);
    }
    if POSITIVE_SYMBOLS.iter().any(|s| lower.contains(s))
        || POSITIVE_MARKS.iter().any(|m| contains_word(&lower, m))
    {
        return Some(true);
    }
    None
}
