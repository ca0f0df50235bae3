//! Territory catalog: the static per-state member requirements and
//! informational reward rates.
//!
//! The catalog is immutable. Build it once at startup and share it
//! behind an `Arc`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::territory::Territory;

/// Member requirement used for names the catalog does not know.
pub const DEFAULT_REQUIRED_MEMBERS: u32 = 1;

/// Claim requirement and reward terms for one territory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryTerms {
    pub territory: Territory,
    pub required_members: u32,
    pub base_hourly_rate: f64,
    pub member_rate_multiplier: f64,
}

impl TerritoryTerms {
    /// Hourly reward for a holder with `member_count` members:
    /// `base + member_count * multiplier`. Informational only.
    pub fn hourly_rate(&self, member_count: u32) -> f64 {
        self.base_hourly_rate + f64::from(member_count) * self.member_rate_multiplier
    }
}

const fn terms(
    territory: Territory,
    required_members: u32,
    base_hourly_rate: f64,
    member_rate_multiplier: f64,
) -> TerritoryTerms {
    TerritoryTerms {
        territory,
        required_members,
        base_hourly_rate,
        member_rate_multiplier,
    }
}

const DEFAULT_TERMS: [TerritoryTerms; 50] = [
    terms(Territory::California, 15, 0.50, 0.02),
    terms(Territory::Texas, 12, 0.45, 0.02),
    terms(Territory::Florida, 10, 0.40, 0.02),
    terms(Territory::NewYork, 10, 0.40, 0.02),
    terms(Territory::Pennsylvania, 8, 0.35, 0.015),
    terms(Territory::Illinois, 8, 0.35, 0.015),
    terms(Territory::Ohio, 7, 0.30, 0.015),
    terms(Territory::Georgia, 7, 0.30, 0.015),
    terms(Territory::NorthCarolina, 6, 0.25, 0.015),
    terms(Territory::Michigan, 6, 0.25, 0.015),
    terms(Territory::NewJersey, 5, 0.25, 0.01),
    terms(Territory::Virginia, 5, 0.25, 0.01),
    terms(Territory::Washington, 5, 0.25, 0.01),
    terms(Territory::Arizona, 4, 0.20, 0.01),
    terms(Territory::Massachusetts, 4, 0.20, 0.01),
    terms(Territory::Tennessee, 4, 0.20, 0.01),
    terms(Territory::Indiana, 3, 0.20, 0.01),
    terms(Territory::Missouri, 3, 0.20, 0.01),
    terms(Territory::Maryland, 3, 0.20, 0.01),
    terms(Territory::Wisconsin, 3, 0.20, 0.01),
    terms(Territory::Colorado, 3, 0.20, 0.01),
    terms(Territory::Minnesota, 3, 0.20, 0.01),
    terms(Territory::SouthCarolina, 2, 0.15, 0.01),
    terms(Territory::Alabama, 2, 0.15, 0.01),
    terms(Territory::Louisiana, 2, 0.15, 0.01),
    terms(Territory::Kentucky, 2, 0.15, 0.01),
    terms(Territory::Oregon, 2, 0.15, 0.01),
    terms(Territory::Oklahoma, 2, 0.15, 0.01),
    terms(Territory::Connecticut, 2, 0.15, 0.01),
    terms(Territory::Utah, 1, 0.15, 0.005),
    terms(Territory::Iowa, 1, 0.15, 0.005),
    terms(Territory::Nevada, 1, 0.15, 0.005),
    terms(Territory::Arkansas, 1, 0.15, 0.005),
    terms(Territory::Mississippi, 1, 0.15, 0.005),
    terms(Territory::Kansas, 1, 0.15, 0.005),
    terms(Territory::NewMexico, 1, 0.15, 0.005),
    terms(Territory::Nebraska, 1, 0.15, 0.005),
    terms(Territory::WestVirginia, 1, 0.15, 0.005),
    terms(Territory::Idaho, 1, 0.15, 0.005),
    terms(Territory::Hawaii, 1, 0.15, 0.005),
    terms(Territory::NewHampshire, 1, 0.15, 0.005),
    terms(Territory::Maine, 1, 0.15, 0.005),
    terms(Territory::Montana, 1, 0.15, 0.005),
    terms(Territory::RhodeIsland, 1, 0.15, 0.005),
    terms(Territory::Delaware, 1, 0.15, 0.005),
    terms(Territory::SouthDakota, 1, 0.15, 0.005),
    terms(Territory::NorthDakota, 1, 0.15, 0.005),
    terms(Territory::Alaska, 1, 0.15, 0.005),
    terms(Territory::Vermont, 1, 0.15, 0.005),
    terms(Territory::Wyoming, 1, 0.15, 0.005),
];

/// Read-only lookup of territory terms.
pub trait TerritoryCatalog: Send + Sync {
    fn terms(&self, territory: Territory) -> Option<TerritoryTerms>;

    /// All known terms, in territory order.
    fn all(&self) -> Vec<TerritoryTerms>;

    /// Members a nation needs to claim `name`. Unknown names fall back
    /// to [`DEFAULT_REQUIRED_MEMBERS`].
    fn required_members(&self, name: &str) -> u32 {
        Territory::from_name(name)
            .and_then(|t| self.terms(t))
            .map(|t| t.required_members)
            .unwrap_or(DEFAULT_REQUIRED_MEMBERS)
    }

    /// Informational hourly rate; `0.0` for unknown names.
    fn hourly_rate(&self, name: &str, member_count: u32) -> f64 {
        Territory::from_name(name)
            .and_then(|t| self.terms(t))
            .map(|t| t.hourly_rate(member_count))
            .unwrap_or(0.0)
    }
}

/// In-memory catalog backed by an ordered map.
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    entries: BTreeMap<Territory, TerritoryTerms>,
}

impl StaticCatalog {
    /// Build a catalog from explicit terms. Later entries for the same
    /// territory replace earlier ones.
    pub fn from_terms(terms: impl IntoIterator<Item = TerritoryTerms>) -> Self {
        Self {
            entries: terms.into_iter().map(|t| (t.territory, t)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StaticCatalog {
    /// The production table for all fifty states.
    fn default() -> Self {
        Self::from_terms(DEFAULT_TERMS)
    }
}

impl TerritoryCatalog for StaticCatalog {
    fn terms(&self, territory: Territory) -> Option<TerritoryTerms> {
        self.entries.get(&territory).copied()
    }

    fn all(&self) -> Vec<TerritoryTerms> {
        self.entries.values().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_covers_every_territory() {
        let catalog = StaticCatalog::default();
        assert_eq!(catalog.len(), 50);
        for territory in Territory::ALL {
            assert!(catalog.terms(*territory).is_some(), "missing {territory}");
        }
    }

    #[test]
    fn requirements_match_the_published_table() {
        let catalog = StaticCatalog::default();
        assert_eq!(catalog.required_members("California"), 15);
        assert_eq!(catalog.required_members("Texas"), 12);
        assert_eq!(catalog.required_members("new york"), 10);
        assert_eq!(catalog.required_members("Wyoming"), 1);
    }

    #[test]
    fn unknown_names_default_to_one_member() {
        let catalog = StaticCatalog::default();
        assert_eq!(catalog.required_members("Atlantis"), DEFAULT_REQUIRED_MEMBERS);
        assert_eq!(catalog.hourly_rate("Atlantis", 10), 0.0);
    }

    #[test]
    fn hourly_rate_grows_with_members() {
        let catalog = StaticCatalog::default();
        let rate = catalog.hourly_rate("California", 20);
        assert!((rate - 0.90).abs() < 1e-9, "got {rate}");
        let wyoming = catalog.hourly_rate("Wyoming", 2);
        assert!((wyoming - 0.16).abs() < 1e-9, "got {wyoming}");
    }

    #[test]
    fn custom_terms_override_defaults() {
        let catalog = StaticCatalog::from_terms([terms(Territory::Wyoming, 3, 1.0, 0.1)]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.required_members("Wyoming"), 3);
        assert_eq!(catalog.required_members("Texas"), DEFAULT_REQUIRED_MEMBERS);
    }
}
