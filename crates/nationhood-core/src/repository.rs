//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Every mutating method is a
//! single storage transaction: the implementation re-checks the
//! invariants it guards inside that transaction, so two racing callers
//! cannot both pass an application-level pre-check and commit.

use uuid::Uuid;

use crate::error::NationResult;
use crate::models::nation::{ClaimTerritory, CreateNation, Nation};
use crate::models::territory::Territory;
use crate::models::user::{User, WalletAddress};

// ---------------------------------------------------------------------------
// Identity store
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Return the user for `address`, creating an unaffiliated record on
    /// first sight. Calling this twice yields the same record.
    fn get_or_create(&self, address: &WalletAddress)
    -> impl Future<Output = NationResult<User>> + Send;

    fn get_by_address(
        &self,
        address: &WalletAddress,
    ) -> impl Future<Output = NationResult<User>> + Send;

    /// Set or clear the user's nation reference. Idempotent.
    fn set_nation(
        &self,
        address: &WalletAddress,
        nation_id: Option<Uuid>,
    ) -> impl Future<Output = NationResult<User>> + Send;

    /// All users currently referencing `nation_id`.
    fn list_by_nation(
        &self,
        nation_id: Uuid,
    ) -> impl Future<Output = NationResult<Vec<User>>> + Send;
}

// ---------------------------------------------------------------------------
// Nation registry
// ---------------------------------------------------------------------------

pub trait NationRepository: Send + Sync {
    /// Found a nation and link its founder.
    ///
    /// Fails with `NotFound` if the founder has no user record,
    /// `Conflict::AlreadyAffiliated` if the founder already belongs to a
    /// nation and `Conflict::DuplicateName` if the name is taken.
    fn create(&self, input: CreateNation) -> impl Future<Output = NationResult<Nation>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = NationResult<Nation>> + Send;

    /// The nation currently holding `territory`, if any.
    fn get_by_territory(
        &self,
        territory: Territory,
    ) -> impl Future<Output = NationResult<Option<Nation>>> + Send;

    /// All nations, newest first.
    fn list(&self) -> impl Future<Output = NationResult<Vec<Nation>>> + Send;

    /// Nations whose name or founder address contains `query`
    /// (case-insensitive), newest first.
    fn search(&self, query: &str) -> impl Future<Output = NationResult<Vec<Nation>>> + Send;

    /// Append `address` to the members and link the user to the nation.
    fn add_member(
        &self,
        nation_id: Uuid,
        address: &WalletAddress,
    ) -> impl Future<Output = NationResult<Nation>> + Send;

    /// Remove `address` from the members and clear the user's nation
    /// reference. Removing a non-member only clears the reference; the
    /// founder can never be removed.
    fn remove_member(
        &self,
        nation_id: Uuid,
        address: &WalletAddress,
    ) -> impl Future<Output = NationResult<Nation>> + Send;

    /// Record a territory claim.
    ///
    /// Fails with `Conflict::TerritoryAlreadyHeld` if the nation holds a
    /// territory, `Conflict::TerritoryTaken` if another nation holds
    /// this one and `Forbidden::InsufficientMembers` if the live member
    /// count is below `required_members`.
    fn set_territory(
        &self,
        input: ClaimTerritory,
    ) -> impl Future<Output = NationResult<Nation>> + Send;

    /// Delete the nation, release its territory and clear the nation
    /// reference of every user pointing at it. Returns the released
    /// addresses.
    fn delete(&self, id: Uuid) -> impl Future<Output = NationResult<Vec<WalletAddress>>> + Send;
}
