//! SurrealDB implementation of [`UserRepository`].
//!
//! User records are keyed by their normalized wallet address
//! (`user:⟨0xabc…⟩`), so the record key itself is the uniqueness
//! constraint.

use chrono::{DateTime, Utc};
use nationhood_core::error::{Entity, NationResult};
use nationhood_core::models::user::{User, WalletAddress};
use nationhood_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct.
#[derive(Debug, SurrealValue)]
struct UserRow {
    address: String,
    nation_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn try_into_user(self) -> Result<User, DbError> {
        let address = WalletAddress::parse(&self.address)
            .map_err(|e| DbError::Decode(format!("invalid address {}: {e}", self.address)))?;
        let nation_id = self
            .nation_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|e| DbError::Decode(format!("invalid nation UUID: {e}")))?;
        Ok(User {
            address,
            nation_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find(&self, address: &WalletAddress) -> Result<Option<User>, DbError> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $address)")
            .bind(("address", address.to_string()))
            .await?;

        let rows: Vec<UserRow> = result.take(0)?;
        rows.into_iter().next().map(UserRow::try_into_user).transpose()
    }

    async fn insert(&self, address: &WalletAddress) -> Result<User, DbError> {
        let result = self
            .db
            .query(
                "CREATE type::record('user', $address) SET \
                 address = $address, nation_id = NONE",
            )
            .bind(("address", address.to_string()))
            .await?;

        let mut result = result.check().map_err(DbError::from_query)?;

        let rows: Vec<UserRow> = result.take(0)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: Entity::User,
            id: address.to_string(),
        })?;
        row.try_into_user()
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn get_or_create(&self, address: &WalletAddress) -> NationResult<User> {
        if let Some(user) = self.find(address).await? {
            debug!(%address, "Existing user");
            return Ok(user);
        }

        match self.insert(address).await {
            Ok(user) => {
                info!(%address, "Registered new user");
                Ok(user)
            }
            // Lost a race with a concurrent first sign-in.
            Err(DbError::Query(msg))
                if msg.contains("already exists") || msg.contains("idx_user_address") =>
            {
                debug!(%address, "User created concurrently");
                self.find(address).await?.ok_or_else(|| {
                    DbError::NotFound {
                        entity: Entity::User,
                        id: address.to_string(),
                    }
                    .into()
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_address(&self, address: &WalletAddress) -> NationResult<User> {
        self.find(address).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: Entity::User,
                id: address.to_string(),
            }
            .into()
        })
    }

    async fn set_nation(
        &self,
        address: &WalletAddress,
        nation_id: Option<Uuid>,
    ) -> NationResult<User> {
        let builder = match nation_id {
            Some(id) => self
                .db
                .query(
                    "UPDATE type::record('user', $address) SET \
                     nation_id = $nation_id, updated_at = time::now()",
                )
                .bind(("nation_id", id.to_string())),
            None => self.db.query(
                "UPDATE type::record('user', $address) SET \
                 nation_id = NONE, updated_at = time::now()",
            ),
        };

        let result = builder
            .bind(("address", address.to_string()))
            .await
            .map_err(DbError::from)?;
        let mut result = result.check().map_err(DbError::from_query)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: Entity::User,
            id: address.to_string(),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn list_by_nation(&self, nation_id: Uuid) -> NationResult<Vec<User>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM user WHERE nation_id = $nation_id \
                 ORDER BY created_at ASC",
            )
            .bind(("nation_id", nation_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;

        let users = rows
            .into_iter()
            .map(UserRow::try_into_user)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(users)
    }
}
