//! Error types for the Nationhood system.
//!
//! Every failure belongs to one of five categories ([`ErrorKind`]).
//! Business-rule violations carry a dedicated variant so callers can
//! match on the exact precondition that failed, while the `Display`
//! output is the short message shown to end users.

use std::fmt;

use thiserror::Error;

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entities that can be looked up by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    User,
    Nation,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => f.write_str("User"),
            Entity::Nation => f.write_str("Nation"),
        }
    }
}

/// Invariant violations: the request is well-formed but the current
/// state does not allow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("You already belong to a nation")]
    AlreadyAffiliated,

    #[error("You are not a member of any nation")]
    NotAffiliated,

    #[error("Founders cannot leave their nation. Please delete the nation instead.")]
    FounderCannotLeave,

    #[error("A nation with this name already exists")]
    DuplicateName,

    #[error("Nation already has a territory")]
    TerritoryAlreadyHeld,

    #[error("Territory already claimed by another nation")]
    TerritoryTaken,
}

/// Founder-only actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FounderAction {
    ClaimTerritory,
    DeleteNation,
}

impl fmt::Display for FounderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FounderAction::ClaimTerritory => f.write_str("claim territory"),
            FounderAction::DeleteNation => f.write_str("delete the nation"),
        }
    }
}

/// Authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Forbidden {
    #[error("Only the founder can {action}")]
    NotFounder { action: FounderAction },

    #[error("Your nation needs at least {required} members to claim {territory} (has {actual})")]
    InsufficientMembers {
        territory: String,
        required: u32,
        actual: u32,
    },
}

#[derive(Debug, Error)]
pub enum NationError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{entity} not found")]
    NotFound { entity: Entity, id: String },

    #[error(transparent)]
    Conflict(#[from] Conflict),

    #[error(transparent)]
    Forbidden(#[from] Forbidden),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NationError {
    pub fn validation(message: impl Into<String>) -> Self {
        NationError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        NationError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            NationError::Validation { .. } => ErrorKind::Validation,
            NationError::NotFound { .. } => ErrorKind::NotFound,
            NationError::Conflict(_) => ErrorKind::Conflict,
            NationError::Forbidden(_) => ErrorKind::Forbidden,
            NationError::Database(_) | NationError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Only storage-layer failures are worth retrying; everything else
    /// reflects bad input or the current state.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }
}

pub type NationResult<T> = Result<T, NationError>;
