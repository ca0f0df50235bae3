//! User domain model.
//!
//! A user is nothing more than a wallet address plus, optionally, the
//! nation it currently belongs to. Addresses are normalized once, when
//! a [`WalletAddress`] is constructed, so every comparison further down
//! is a plain equality check.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{NationError, NationResult};

/// A lowercase-normalized wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Trim and lowercase a raw address. Empty input is rejected.
    pub fn parse(raw: &str) -> NationResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NationError::validation("Wallet address is required"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(NationError::validation(
                "Wallet address must not contain whitespace",
            ));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = NationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub address: WalletAddress,
    /// The nation this user belongs to, if any.
    pub nation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_affiliated(&self) -> bool {
        self.nation_id.is_some()
    }
}
