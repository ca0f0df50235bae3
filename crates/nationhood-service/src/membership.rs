//! Membership coordinator: create, join, leave and delete.
//!
//! Per user the state machine is
//! `Unaffiliated -> Affiliated(Founder | Member) -> Unaffiliated`.
//! Each operation first checks its preconditions against a fresh read so
//! the caller gets a precise error, then issues exactly one guarded
//! repository write, which re-checks the same preconditions inside its
//! own transaction.

use nationhood_core::error::{
    Conflict, Entity, FounderAction, Forbidden, NationError, NationResult,
};
use nationhood_core::models::nation::{CreateNation, MemberRole, Nation, NationName};
use nationhood_core::models::user::WalletAddress;
use nationhood_core::repository::{NationRepository, UserRepository};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Parse a client-supplied nation id. An id that cannot name any
/// nation is reported as a missing nation.
pub fn parse_nation_id(raw: &str) -> NationResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| NationError::not_found(Entity::Nation, raw.trim()))
}

/// Result of `leave_nation`.
#[derive(Debug, Clone, PartialEq)]
pub enum Departure {
    /// The user was removed from `nation`, shown after the removal.
    Left { nation: Nation },
    /// The referenced nation no longer existed; the dangling reference
    /// was cleared.
    ReferenceCleared,
}

/// A user's current affiliation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNation {
    pub has_nation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nation: Option<Nation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MemberRole>,
}

pub struct MembershipCoordinator<U: UserRepository, N: NationRepository> {
    user_repo: U,
    nation_repo: N,
}

impl<U: UserRepository, N: NationRepository> MembershipCoordinator<U, N> {
    pub fn new(user_repo: U, nation_repo: N) -> Self {
        Self {
            user_repo,
            nation_repo,
        }
    }

    /// Found a nation named `raw_name` with the caller as founder.
    pub async fn create_nation(&self, raw_address: &str, raw_name: &str) -> NationResult<Nation> {
        let address = WalletAddress::parse(raw_address)?;
        let name = NationName::parse(raw_name)?;

        let user = self.user_repo.get_by_address(&address).await?;
        if user.is_affiliated() {
            return Err(Conflict::AlreadyAffiliated.into());
        }

        let nation = self
            .nation_repo
            .create(CreateNation {
                name,
                founder: address,
            })
            .await?;

        info!(nation_id = %nation.id, name = %nation.name, "Nation created");
        Ok(nation)
    }

    /// Add the caller to an existing nation. There is no member cap.
    pub async fn join_nation(&self, raw_address: &str, nation_id: Uuid) -> NationResult<Nation> {
        let address = WalletAddress::parse(raw_address)?;

        let user = self.user_repo.get_by_address(&address).await?;
        if user.is_affiliated() {
            return Err(Conflict::AlreadyAffiliated.into());
        }
        self.nation_repo.get_by_id(nation_id).await?;

        self.nation_repo.add_member(nation_id, &address).await
    }

    /// Leave the caller's nation. Founders must delete instead.
    pub async fn leave_nation(&self, raw_address: &str) -> NationResult<Departure> {
        let address = WalletAddress::parse(raw_address)?;

        let user = self.user_repo.get_by_address(&address).await?;
        let Some(nation_id) = user.nation_id else {
            return Err(Conflict::NotAffiliated.into());
        };

        let nation = match self.nation_repo.get_by_id(nation_id).await {
            Ok(nation) => nation,
            Err(NationError::NotFound {
                entity: Entity::Nation,
                ..
            }) => {
                warn!(%address, %nation_id, "Clearing reference to missing nation");
                self.user_repo.set_nation(&address, None).await?;
                return Ok(Departure::ReferenceCleared);
            }
            Err(e) => return Err(e),
        };

        if nation.is_founder(&address) {
            return Err(Conflict::FounderCannotLeave.into());
        }

        let nation = self.nation_repo.remove_member(nation_id, &address).await?;
        Ok(Departure::Left { nation })
    }

    /// Delete a nation on behalf of its founder. Every member, the
    /// founder included, becomes unaffiliated and the territory is
    /// released. Returns the released addresses.
    pub async fn delete_nation(
        &self,
        nation_id: Uuid,
        raw_address: &str,
    ) -> NationResult<Vec<WalletAddress>> {
        let address = WalletAddress::parse(raw_address)?;

        self.user_repo.get_by_address(&address).await?;
        let nation = self.nation_repo.get_by_id(nation_id).await?;
        if !nation.is_founder(&address) {
            warn!(%nation_id, %address, "Non-founder attempted delete");
            return Err(Forbidden::NotFounder {
                action: FounderAction::DeleteNation,
            }
            .into());
        }

        self.nation_repo.delete(nation_id).await
    }

    /// The caller's nation, if any.
    pub async fn user_nation(&self, raw_address: &str) -> NationResult<UserNation> {
        let address = WalletAddress::parse(raw_address)?;
        let user = self.user_repo.get_by_address(&address).await?;

        match user.nation_id {
            None => Ok(UserNation {
                has_nation: false,
                nation: None,
                role: None,
            }),
            Some(id) => {
                let nation = self.nation_repo.get_by_id(id).await?;
                Ok(UserNation {
                    has_nation: true,
                    role: nation.role_of(&address),
                    nation: Some(nation),
                })
            }
        }
    }

    /// All nations newest first, filtered by `query` when it is not
    /// blank.
    pub async fn list_nations(&self, query: Option<&str>) -> NationResult<Vec<Nation>> {
        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => self.nation_repo.search(q).await,
            None => self.nation_repo.list().await,
        }
    }
}
