//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode. UUIDs are stored as
//! strings. Uniqueness that the domain relies on is declared here so
//! that a racing duplicate write is rejected by the store itself:
//!
//! - `user` records are keyed by wallet address;
//! - `nation.name` has a unique index;
//! - `territory_claim` records are keyed by territory name, and their
//!   `nation_id` has a unique index.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users, keyed by lowercase wallet address
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD address ON TABLE user TYPE string \
    ASSERT $value = string::lowercase($value) AND string::len($value) > 0;
DEFINE FIELD nation_id ON TABLE user TYPE option<string>;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_address ON TABLE user COLUMNS address UNIQUE;
DEFINE INDEX idx_user_nation ON TABLE user COLUMNS nation_id;

-- =======================================================================
-- Nations
-- =======================================================================
DEFINE TABLE nation SCHEMAFULL;
DEFINE FIELD name ON TABLE nation TYPE string \
    ASSERT string::len($value) > 0 AND string::len($value) <= 50;
DEFINE FIELD founder_address ON TABLE nation TYPE string;
DEFINE FIELD members ON TABLE nation TYPE array<string> DEFAULT [];
DEFINE FIELD member_count ON TABLE nation TYPE int DEFAULT 0 \
    ASSERT $value >= 0;
DEFINE FIELD territory ON TABLE nation TYPE option<string>;
DEFINE FIELD created_at ON TABLE nation TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE nation TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_nation_name ON TABLE nation COLUMNS name UNIQUE;
DEFINE INDEX idx_nation_created ON TABLE nation COLUMNS created_at;

-- =======================================================================
-- Territory claims, keyed by territory name
-- =======================================================================
DEFINE TABLE territory_claim SCHEMAFULL;
DEFINE FIELD nation_id ON TABLE territory_claim TYPE string;
DEFINE FIELD claimed_at ON TABLE territory_claim TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_claim_nation ON TABLE territory_claim \
    COLUMNS nation_id UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(version = migration.version, "Migration applied");
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
