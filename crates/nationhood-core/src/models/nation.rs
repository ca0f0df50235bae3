//! Nation domain model.
//!
//! A nation is founded by exactly one user, who stays a member for as
//! long as the nation exists. It may hold at most one territory; once
//! set, the territory only changes through an external map reset.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::territory::Territory;
use super::user::WalletAddress;
use crate::error::{NationError, NationResult};

/// Maximum length of a nation name, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// A trimmed, non-empty nation name of at most [`MAX_NAME_LEN`] characters.
///
/// Uniqueness is exact-match: `"Atlantis"` and `"atlantis"` are
/// different names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NationName(String);

impl NationName {
    pub fn parse(raw: &str) -> NationResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NationError::validation("Nation name is required"));
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(NationError::validation(format!(
                "Name cannot be more than {MAX_NAME_LEN} characters"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NationName {
    type Error = NationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NationName> for String {
    fn from(value: NationName) -> Self {
        value.0
    }
}

/// Role of a member within its nation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Founder,
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Nation {
    pub id: Uuid,
    pub name: NationName,
    pub founder_address: WalletAddress,
    /// Always equal to `members.len()`.
    pub member_count: u32,
    /// Join order; the founder comes first.
    pub members: Vec<WalletAddress>,
    pub territory: Option<Territory>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Nation {
    pub fn is_founder(&self, address: &WalletAddress) -> bool {
        &self.founder_address == address
    }

    pub fn has_member(&self, address: &WalletAddress) -> bool {
        self.members.iter().any(|m| m == address)
    }

    pub fn role_of(&self, address: &WalletAddress) -> Option<MemberRole> {
        if self.is_founder(address) {
            Some(MemberRole::Founder)
        } else if self.has_member(address) {
            Some(MemberRole::Member)
        } else {
            None
        }
    }
}

/// Fields required to found a new nation.
#[derive(Debug, Clone)]
pub struct CreateNation {
    pub name: NationName,
    pub founder: WalletAddress,
}

/// A guarded territory write. The storage layer re-checks
/// `required_members` against the live member count.
#[derive(Debug, Clone)]
pub struct ClaimTerritory {
    pub nation_id: Uuid,
    pub territory: Territory,
    pub required_members: u32,
}
