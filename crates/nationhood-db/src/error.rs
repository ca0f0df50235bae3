//! Database-specific error types and conversions.
//!
//! Guarded writes abort with `THROW "guard:<kind>[:<detail>...]"`. The
//! helpers here turn those sentinels, and unique-index violations, back
//! into domain errors.

use nationhood_core::error::{Conflict, Entity, NationError};

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Undecodable record: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: Entity, id: String },

    #[error(transparent)]
    Conflict(Conflict),

    #[error("insufficient members: required {required}, actual {actual}")]
    InsufficientMembers { required: u32, actual: u32 },
}

impl DbError {
    /// Classify a failed statement.
    pub(crate) fn from_query(err: surrealdb::Error) -> Self {
        let message = err.to_string();
        classify(&message).unwrap_or(DbError::Query(message))
    }
}

const GUARD_PREFIX: &str = "guard:";

#[derive(Clone, Copy)]
enum Marker {
    Guard,
    NationName,
    ClaimNation,
    ClaimRecord,
    Opaque,
}

/// Structural markers. Storage errors echo offending values after the
/// marker, so only the earliest marker in a message is trusted.
const MARKERS: &[(&str, Marker)] = &[
    (GUARD_PREFIX, Marker::Guard),
    ("idx_nation_name", Marker::NationName),
    ("idx_claim_nation", Marker::ClaimNation),
    ("territory_claim:", Marker::ClaimRecord),
    ("idx_user_address", Marker::Opaque),
    ("`user:", Marker::Opaque),
];

fn classify(message: &str) -> Option<DbError> {
    let (at, marker) = MARKERS
        .iter()
        .filter_map(|(needle, marker)| message.find(needle).map(|at| (at, *marker)))
        .min_by_key(|(at, _)| *at)?;

    match marker {
        Marker::Guard => parse_guard(&message[at..]),
        Marker::NationName => Some(DbError::Conflict(Conflict::DuplicateName)),
        Marker::ClaimNation => Some(DbError::Conflict(Conflict::TerritoryAlreadyHeld)),
        Marker::ClaimRecord if message.contains("already exists") => {
            Some(DbError::Conflict(Conflict::TerritoryTaken))
        }
        Marker::ClaimRecord | Marker::Opaque => None,
    }
}

fn parse_guard(message: &str) -> Option<DbError> {
    let tail = message
        .strip_prefix(GUARD_PREFIX)?
        .trim_end_matches(|c: char| matches!(c, '"' | '\'' | '`') || c.is_whitespace());
    let mut parts = tail.split(':');
    let kind = parts.next()?;
    let detail = parts.next().unwrap_or_default().to_string();

    let err = match kind {
        "user_not_found" => DbError::NotFound {
            entity: Entity::User,
            id: detail,
        },
        "nation_not_found" => DbError::NotFound {
            entity: Entity::Nation,
            id: detail,
        },
        "already_affiliated" => DbError::Conflict(Conflict::AlreadyAffiliated),
        "founder_cannot_leave" => DbError::Conflict(Conflict::FounderCannotLeave),
        "territory_already_held" => DbError::Conflict(Conflict::TerritoryAlreadyHeld),
        "insufficient_members" => DbError::InsufficientMembers {
            required: detail.parse().ok()?,
            actual: parts.next()?.parse().ok()?,
        },
        _ => return None,
    };
    Some(err)
}

impl From<DbError> for NationError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => NationError::NotFound { entity, id },
            DbError::Conflict(conflict) => NationError::Conflict(conflict),
            DbError::Decode(msg) => NationError::Internal(msg),
            // Callers that know the territory replace this with a
            // `Forbidden::InsufficientMembers`.
            other @ DbError::InsufficientMembers { .. } => NationError::Internal(other.to_string()),
            other => NationError::Database(other.to_string()),
        }
    }
}
