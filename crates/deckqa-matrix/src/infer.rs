//! The cumulative-tier rule: tiers in this domain are strictly additive, so
//! a feature available at some tier is available at every higher tier
//! unless the deck explicitly says otherwise.

use deckqa_core::matrix::{Availability, MatrixTable, Tier};

/// Fill unmarked cells from the marked ones, per feature:
/// - every tier above the lowest available tier becomes `Inferred(true)`
/// - every tier below it becomes `Inferred(false)`
///
/// Explicit marks are never touched; an explicit negative above an
/// available tier stands.
pub fn apply_cumulative_inference(table: &mut MatrixTable) {
    let features = table.features.clone();
    for feature in features {
        let lowest_available = Tier::ALL
            .into_iter()
            .find(|tier| table.is_available(&feature, *tier) == Some(true));
        let Some(lowest) = lowest_available else {
            continue;
        };
        for tier in Tier::ALL {
            if table.get(&feature, tier).is_none() {
                table.set(&feature, tier, Availability::Inferred(tier > lowest));
            }
        }
    }
}
