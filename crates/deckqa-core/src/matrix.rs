//! License-tier data model: the fixed tier ladder and the derived
//! feature-by-tier availability table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::ChunkId;

/// A named license level. The declaration order is the cumulative
/// capability order: everything available at a tier is available at every
/// higher tier unless explicitly marked otherwise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Tier {
    Standard,
    Professional,
    ProfessionalPlus,
    Enterprise,
}

impl Tier {
    pub const ALL: [Tier; 4] = [
        Tier::Standard,
        Tier::Professional,
        Tier::ProfessionalPlus,
        Tier::Enterprise,
    ];

    /// Alias spellings as they appear in deck content, longest first so
    /// "professional plus" wins over "professional" and "pro+" over "pro".
    pub const ALIASES: [(&'static str, Tier); 9] = [
        ("professional plus", Tier::ProfessionalPlus),
        ("professional", Tier::Professional),
        ("enterprise", Tier::Enterprise),
        ("pro plus", Tier::ProfessionalPlus),
        ("standard", Tier::Standard),
        ("pro+", Tier::ProfessionalPlus),
        ("ent", Tier::Enterprise),
        ("pro", Tier::Professional),
        ("std", Tier::Standard),
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Tier::Standard => "Standard",
            Tier::Professional => "Professional",
            Tier::ProfessionalPlus => "Professional Plus",
            Tier::Enterprise => "Enterprise",
        }
    }

    /// Parse a single alias token ("pro+", "enterprise", ...).
    #[must_use]
    pub fn parse(token: &str) -> Option<Tier> {
        let token = token.trim().to_lowercase();
        Tier::ALIASES
            .iter()
            .find(|(alias, _)| *alias == token)
            .map(|(_, tier)| *tier)
    }
}

/// An availability mark, remembering whether it was read off the deck or
/// inferred from the cumulative-tier rule. Explicit marks always win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Explicit(bool),
    Inferred(bool),
}

impl Availability {
    #[must_use]
    pub fn value(self) -> bool {
        match self {
            Availability::Explicit(v) | Availability::Inferred(v) => v,
        }
    }

    #[must_use]
    pub fn is_explicit(self) -> bool {
        matches!(self, Availability::Explicit(_))
    }
}

/// Feature-by-tier availability grid derived from matrix-shaped chunks.
///
/// Per-query lifecycle: built on demand, projected to the tiers the query
/// names, discarded after response assembly. Parse problems are recorded in
/// `warnings` rather than failing the build; partial tables are valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatrixTable {
    pub tiers: Vec<Tier>,
    pub features: Vec<String>,
    availability: HashMap<(String, Tier), Availability>,
    pub warnings: Vec<String>,
    pub source_ids: Vec<ChunkId>,
}

impl MatrixTable {
    #[must_use]
    pub fn new() -> Self {
        Self { tiers: Tier::ALL.to_vec(), ..Self::default() }
    }

    /// Record a mark. Explicit marks overwrite anything; inferred marks
    /// never displace an explicit one.
    pub fn set(&mut self, feature: &str, tier: Tier, mark: Availability) {
        if !self.features.iter().any(|f| f == feature) {
            self.features.push(feature.to_string());
        }
        let key = (feature.to_string(), tier);
        match self.availability.get(&key) {
            Some(existing) if existing.is_explicit() && !mark.is_explicit() => {}
            _ => {
                self.availability.insert(key, mark);
            }
        }
    }

    #[must_use]
    pub fn get(&self, feature: &str, tier: Tier) -> Option<Availability> {
        self.availability.get(&(feature.to_string(), tier)).copied()
    }

    /// `Some(true)`/`Some(false)` when the grid has a mark (explicit or
    /// inferred) for the cell, `None` when nothing is known.
    #[must_use]
    pub fn is_available(&self, feature: &str, tier: Tier) -> Option<bool> {
        self.get(feature, tier).map(Availability::value)
    }

    /// Restrict the table to the given tier columns, dropping marks for
    /// tiers outside the projection. Feature rows are kept as-is.
    pub fn project(&mut self, tiers: &[Tier]) {
        if tiers.is_empty() {
            return;
        }
        self.tiers.retain(|t| tiers.contains(t));
        self.availability.retain(|(_, tier), _| tiers.contains(tier));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
