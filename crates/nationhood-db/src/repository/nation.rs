//! SurrealDB implementation of [`NationRepository`].
//!
//! Each mutating method runs as one block statement. SurrealDB executes
//! a statement in a single transaction, so the guard clauses at the top
//! of a block and the writes below them commit or roll back together.
//! A failed guard aborts with `THROW "guard:<kind>..."`, decoded by
//! [`DbError::from_query`].

use chrono::{DateTime, Utc};
use nationhood_core::error::{Entity, Forbidden, NationError, NationResult};
use nationhood_core::models::nation::{ClaimTerritory, CreateNation, Nation, NationName};
use nationhood_core::models::territory::Territory;
use nationhood_core::models::user::WalletAddress;
use nationhood_core::repository::NationRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::DbError;

const SELECT_NATION: &str = "SELECT meta::id(id) AS record_id, * FROM type::record('nation', $id)";

const CREATE_NATION: &str = "{
    LET $user = (SELECT * FROM type::record('user', $founder))[0];
    IF $user = NONE {
        THROW string::concat('guard:user_not_found:', $founder);
    };
    IF $user.nation_id != NONE {
        THROW 'guard:already_affiliated';
    };
    CREATE type::record('nation', $id) SET
        name = $name,
        founder_address = $founder,
        members = [$founder],
        member_count = 1,
        territory = NONE;
    UPDATE type::record('user', $founder) SET
        nation_id = $id, updated_at = time::now();
    SELECT meta::id(id) AS record_id, * FROM type::record('nation', $id);
}";

const ADD_MEMBER: &str = "{
    LET $user = (SELECT * FROM type::record('user', $address))[0];
    IF $user = NONE {
        THROW string::concat('guard:user_not_found:', $address);
    };
    IF $user.nation_id != NONE {
        THROW 'guard:already_affiliated';
    };
    LET $nation = (SELECT * FROM type::record('nation', $id))[0];
    IF $nation = NONE {
        THROW string::concat('guard:nation_not_found:', $id);
    };
    IF $address NOTINSIDE $nation.members {
        UPDATE type::record('nation', $id) SET members += $address;
    };
    UPDATE type::record('nation', $id) SET
        member_count = array::len(members), updated_at = time::now();
    UPDATE type::record('user', $address) SET
        nation_id = $id, updated_at = time::now();
    SELECT meta::id(id) AS record_id, * FROM type::record('nation', $id);
}";

const REMOVE_MEMBER: &str = "{
    LET $nation = (SELECT * FROM type::record('nation', $id))[0];
    IF $nation = NONE {
        THROW string::concat('guard:nation_not_found:', $id);
    };
    IF $nation.founder_address = $address {
        THROW 'guard:founder_cannot_leave';
    };
    UPDATE type::record('nation', $id) SET members -= $address;
    UPDATE type::record('nation', $id) SET
        member_count = array::len(members), updated_at = time::now();
    UPDATE type::record('user', $address) SET
        nation_id = NONE, updated_at = time::now()
        WHERE nation_id = $id;
    SELECT meta::id(id) AS record_id, * FROM type::record('nation', $id);
}";

const SET_TERRITORY: &str = "{
    LET $nation = (SELECT * FROM type::record('nation', $id))[0];
    IF $nation = NONE {
        THROW string::concat('guard:nation_not_found:', $id);
    };
    IF $nation.territory != NONE {
        THROW 'guard:territory_already_held';
    };
    IF $nation.member_count < $required {
        THROW string::concat(
            'guard:insufficient_members:',
            <string> $required, ':', <string> $nation.member_count
        );
    };
    CREATE type::record('territory_claim', $territory) SET nation_id = $id;
    UPDATE type::record('nation', $id) SET
        territory = $territory, updated_at = time::now();
    SELECT meta::id(id) AS record_id, * FROM type::record('nation', $id);
}";

const DELETE_NATION: &str = "{
    LET $nation = (SELECT * FROM type::record('nation', $id))[0];
    IF $nation = NONE {
        THROW string::concat('guard:nation_not_found:', $id);
    };
    LET $released = (SELECT VALUE address FROM user WHERE nation_id = $id);
    UPDATE user SET nation_id = NONE, updated_at = time::now()
        WHERE nation_id = $id;
    DELETE territory_claim WHERE nation_id = $id;
    DELETE type::record('nation', $id);
    RETURN $released;
}";

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct NationRowWithId {
    record_id: String,
    name: String,
    founder_address: String,
    members: Vec<String>,
    member_count: u32,
    territory: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn decode<T>(what: &str, raw: &str, parsed: NationResult<T>) -> Result<T, DbError> {
    parsed.map_err(|e| DbError::Decode(format!("invalid {what} {raw:?}: {e}")))
}

impl NationRowWithId {
    fn try_into_nation(self) -> Result<Nation, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let name = decode("name", &self.name, NationName::parse(&self.name))?;
        let founder_address = decode(
            "founder address",
            &self.founder_address,
            WalletAddress::parse(&self.founder_address),
        )?;
        let members = self
            .members
            .iter()
            .map(|m| decode("member address", m, WalletAddress::parse(m)))
            .collect::<Result<Vec<_>, DbError>>()?;
        let territory = self
            .territory
            .as_deref()
            .map(|t| decode("territory", t, t.parse::<Territory>()))
            .transpose()?;

        Ok(Nation {
            id,
            name,
            founder_address,
            member_count: self.member_count,
            members,
            territory,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn first_nation(rows: Vec<NationRowWithId>, id: Uuid) -> Result<Nation, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::NotFound {
            entity: Entity::Nation,
            id: id.to_string(),
        })?
        .try_into_nation()
}

fn into_nations(rows: Vec<NationRowWithId>) -> Result<Vec<Nation>, DbError> {
    rows.into_iter()
        .map(NationRowWithId::try_into_nation)
        .collect()
}

/// SurrealDB implementation of the Nation repository.
#[derive(Clone)]
pub struct SurrealNationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealNationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn run_claim(
        &self,
        nation_id: Uuid,
        territory: Territory,
        required_members: u32,
    ) -> Result<Nation, DbError> {
        let result = self
            .db
            .query(SET_TERRITORY)
            .bind(("id", nation_id.to_string()))
            .bind(("territory", territory.to_string()))
            .bind(("required", required_members))
            .await
            .map_err(DbError::from_query)?;

        let mut result = result.check().map_err(DbError::from_query)?;
        let rows: Vec<NationRowWithId> = result.take(0)?;
        first_nation(rows, nation_id)
    }
}

impl<C: Connection> NationRepository for SurrealNationRepository<C> {
    async fn create(&self, input: CreateNation) -> NationResult<Nation> {
        let id = Uuid::new_v4();

        let result = self
            .db
            .query(CREATE_NATION)
            .bind(("id", id.to_string()))
            .bind(("name", input.name.to_string()))
            .bind(("founder", input.founder.to_string()))
            .await
            .map_err(DbError::from_query)?;

        let mut result = result.check().map_err(DbError::from_query)?;
        let rows: Vec<NationRowWithId> = result.take(0).map_err(DbError::from)?;
        let nation = first_nation(rows, id)?;

        info!(
            nation_id = %nation.id,
            name = %nation.name,
            founder = %nation.founder_address,
            "Nation founded"
        );
        Ok(nation)
    }

    async fn get_by_id(&self, id: Uuid) -> NationResult<Nation> {
        let mut result = self
            .db
            .query(SELECT_NATION)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NationRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(first_nation(rows, id)?)
    }

    async fn get_by_territory(&self, territory: Territory) -> NationResult<Option<Nation>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM nation \
                 WHERE territory = $territory LIMIT 1",
            )
            .bind(("territory", territory.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NationRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(into_nations(rows)?.into_iter().next())
    }

    async fn list(&self) -> NationResult<Vec<Nation>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM nation \
                 ORDER BY created_at DESC",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NationRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(into_nations(rows)?)
    }

    async fn search(&self, query: &str) -> NationResult<Vec<Nation>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.list().await;
        }
        debug!(query = %needle, "Searching nations");

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM nation \
                 WHERE string::contains(string::lowercase(name), $needle) \
                 OR string::contains(founder_address, $needle) \
                 ORDER BY created_at DESC",
            )
            .bind(("needle", needle))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<NationRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(into_nations(rows)?)
    }

    async fn add_member(&self, nation_id: Uuid, address: &WalletAddress) -> NationResult<Nation> {
        let result = self
            .db
            .query(ADD_MEMBER)
            .bind(("id", nation_id.to_string()))
            .bind(("address", address.to_string()))
            .await
            .map_err(DbError::from_query)?;

        let mut result = result.check().map_err(DbError::from_query)?;
        let rows: Vec<NationRowWithId> = result.take(0).map_err(DbError::from)?;
        let nation = first_nation(rows, nation_id)?;

        info!(
            nation_id = %nation.id,
            %address,
            member_count = nation.member_count,
            "Member joined"
        );
        Ok(nation)
    }

    async fn remove_member(
        &self,
        nation_id: Uuid,
        address: &WalletAddress,
    ) -> NationResult<Nation> {
        let result = self
            .db
            .query(REMOVE_MEMBER)
            .bind(("id", nation_id.to_string()))
            .bind(("address", address.to_string()))
            .await
            .map_err(DbError::from_query)?;

        let mut result = result.check().map_err(DbError::from_query)?;
        let rows: Vec<NationRowWithId> = result.take(0).map_err(DbError::from)?;
        let nation = first_nation(rows, nation_id)?;

        info!(
            nation_id = %nation.id,
            %address,
            member_count = nation.member_count,
            "Member left"
        );
        Ok(nation)
    }

    async fn set_territory(&self, input: ClaimTerritory) -> NationResult<Nation> {
        let ClaimTerritory {
            nation_id,
            territory,
            required_members,
        } = input;

        let outcome = self
            .run_claim(nation_id, territory, required_members)
            .await;

        match outcome {
            Ok(nation) => {
                info!(nation_id = %nation.id, %territory, "Territory claimed");
                Ok(nation)
            }
            Err(DbError::InsufficientMembers { required, actual }) => {
                warn!(%nation_id, %territory, required, actual, "Claim refused at commit");
                Err(NationError::Forbidden(Forbidden::InsufficientMembers {
                    territory: territory.to_string(),
                    required,
                    actual,
                }))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> NationResult<Vec<WalletAddress>> {
        let result = self
            .db
            .query(DELETE_NATION)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from_query)?;

        let mut result = result.check().map_err(DbError::from_query)?;
        let released: Vec<String> = result.take(0).map_err(DbError::from)?;
        let released = released
            .iter()
            .map(|a| decode("member address", a, WalletAddress::parse(a)))
            .collect::<Result<Vec<_>, DbError>>()?;

        info!(nation_id = %id, released = released.len(), "Nation deleted");
        Ok(released)
    }
}
