//! Nationhood Service: the operations behind every client action.
//!
//! Services are generic over the repository traits from
//! `nationhood-core`, so this crate has no dependency on the database.

pub mod claim;
pub mod identity;
pub mod membership;

pub use claim::{Claimant, TerritoryClaimEngine, TerritoryStatus};
pub use identity::IdentityService;
pub use membership::{Departure, MembershipCoordinator, UserNation, parse_nation_id};
