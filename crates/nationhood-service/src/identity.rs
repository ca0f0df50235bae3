//! Wallet sign-in.

use nationhood_core::error::NationResult;
use nationhood_core::models::user::{User, WalletAddress};
use nationhood_core::repository::UserRepository;
use tracing::debug;

/// Maps wallet addresses to user records.
pub struct IdentityService<U: UserRepository> {
    user_repo: U,
}

impl<U: UserRepository> IdentityService<U> {
    pub fn new(user_repo: U) -> Self {
        Self { user_repo }
    }

    /// Register `raw_address` on first sight, otherwise return the
    /// existing record. The address is trusted as given.
    pub async fn authenticate(&self, raw_address: &str) -> NationResult<User> {
        let address = WalletAddress::parse(raw_address)?;
        let user = self.user_repo.get_or_create(&address).await?;
        debug!(%address, affiliated = user.is_affiliated(), "Wallet authenticated");
        Ok(user)
    }

    pub async fn get_user(&self, raw_address: &str) -> NationResult<User> {
        let address = WalletAddress::parse(raw_address)?;
        self.user_repo.get_by_address(&address).await
    }
}
