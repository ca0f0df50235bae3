//! Territory claims and the territory overview.

use std::collections::HashMap;
use std::sync::Arc;

use nationhood_core::catalog::{TerritoryCatalog, TerritoryTerms};
use nationhood_core::error::{Conflict, FounderAction, Forbidden, NationResult};
use nationhood_core::models::nation::{ClaimTerritory, Nation};
use nationhood_core::models::territory::Territory;
use nationhood_core::models::user::WalletAddress;
use nationhood_core::repository::NationRepository;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// The nation holding a territory.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Claimant {
    pub nation_id: Uuid,
    pub name: String,
    pub member_count: u32,
    pub hourly_rate: f64,
}

/// One row of the territory overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerritoryStatus {
    #[serde(flatten)]
    pub terms: TerritoryTerms,
    pub claimed_by: Option<Claimant>,
}

pub struct TerritoryClaimEngine<N: NationRepository> {
    nation_repo: N,
    catalog: Arc<dyn TerritoryCatalog>,
}

impl<N: NationRepository> TerritoryClaimEngine<N> {
    pub fn new(nation_repo: N, catalog: Arc<dyn TerritoryCatalog>) -> Self {
        Self {
            nation_repo,
            catalog,
        }
    }

    /// Claim `raw_territory` for a nation on behalf of its founder.
    ///
    /// Checks run in a fixed order: nation exists, requester is the
    /// founder, nation holds no territory, territory is free, member
    /// threshold is met. The final write repeats the last three checks
    /// atomically.
    pub async fn claim_territory(
        &self,
        nation_id: Uuid,
        raw_address: &str,
        raw_territory: &str,
    ) -> NationResult<Nation> {
        let address = WalletAddress::parse(raw_address)?;
        let territory: Territory = raw_territory.parse()?;

        let nation = self.nation_repo.get_by_id(nation_id).await?;

        if !nation.is_founder(&address) {
            warn!(%nation_id, %address, "Non-founder attempted claim");
            return Err(Forbidden::NotFounder {
                action: FounderAction::ClaimTerritory,
            }
            .into());
        }

        if nation.territory.is_some() {
            return Err(Conflict::TerritoryAlreadyHeld.into());
        }

        if let Some(holder) = self.nation_repo.get_by_territory(territory).await? {
            if holder.id != nation.id {
                return Err(Conflict::TerritoryTaken.into());
            }
        }

        let required = self.catalog.required_members(territory.name());
        if nation.member_count < required {
            return Err(Forbidden::InsufficientMembers {
                territory: territory.to_string(),
                required,
                actual: nation.member_count,
            }
            .into());
        }

        let nation = self
            .nation_repo
            .set_territory(ClaimTerritory {
                nation_id,
                territory,
                required_members: required,
            })
            .await?;

        info!(
            %nation_id,
            %territory,
            hourly_rate = self.catalog.hourly_rate(territory.name(), nation.member_count),
            "Territory claim accepted"
        );
        Ok(nation)
    }

    /// Every catalogued territory with its terms and current holder.
    pub async fn territory_overview(&self) -> NationResult<Vec<TerritoryStatus>> {
        let holders: HashMap<Territory, Nation> = self
            .nation_repo
            .list()
            .await?
            .into_iter()
            .filter_map(|n| n.territory.map(|t| (t, n)))
            .collect();

        let rows = self
            .catalog
            .all()
            .into_iter()
            .map(|terms| TerritoryStatus {
                claimed_by: holders.get(&terms.territory).map(|n| Claimant {
                    nation_id: n.id,
                    name: n.name.to_string(),
                    member_count: n.member_count,
                    hourly_rate: terms.hourly_rate(n.member_count),
                }),
                terms,
            })
            .collect();

        Ok(rows)
    }
}
