//! HTTP API.
//!
//! Request and response fields are camelCase. A field that is absent or
//! blank counts as missing.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use nationhood_core::catalog::TerritoryCatalog;
use nationhood_core::models::nation::Nation;
use nationhood_core::models::user::User;
use nationhood_db::repository::{SurrealNationRepository, SurrealUserRepository};
use nationhood_service::{
    Departure, IdentityService, MembershipCoordinator, TerritoryClaimEngine, TerritoryStatus,
    UserNation, parse_nation_id,
};
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;

type Users = SurrealUserRepository<Any>;
type Nations = SurrealNationRepository<Any>;

/// Services shared by every handler.
#[derive(Clone)]
pub struct AppState {
    identity: Arc<IdentityService<Users>>,
    membership: Arc<MembershipCoordinator<Users, Nations>>,
    claims: Arc<TerritoryClaimEngine<Nations>>,
}

impl AppState {
    pub fn new(db: Surreal<Any>, catalog: Arc<dyn TerritoryCatalog>) -> Self {
        let users = SurrealUserRepository::new(db.clone());
        let nations = SurrealNationRepository::new(db);
        Self {
            identity: Arc::new(IdentityService::new(users.clone())),
            membership: Arc::new(MembershipCoordinator::new(users, nations.clone())),
            claims: Arc::new(TerritoryClaimEngine::new(nations, catalog)),
        }
    }
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/wallet", post(authenticate))
        .route("/api/nations", get(list_nations))
        .route("/api/nations/search", get(search_nations))
        .route("/api/nations/user", get(user_nation))
        .route("/api/nations/create", post(create_nation))
        .route("/api/nations/join", post(join_nation))
        .route("/api/nations/leave", post(leave_nation))
        .route("/api/nations/delete", post(delete_nation))
        .route("/api/nations/claim", post(claim_territory))
        .route("/api/territories", get(territories))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// --- Request plumbing ---

fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.trim().is_empty())
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(inner)| inner)
        .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))
}

// --- Response bodies ---

#[derive(Debug, Serialize)]
struct Success<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

type Reply<T> = Result<Json<Success<T>>, ApiError>;

fn ok<T>(body: T) -> Reply<T> {
    Ok(Json(Success {
        success: true,
        body,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserSummary {
    address: String,
    created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            address: user.address.to_string(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct UserBody {
    user: UserSummary,
}

#[derive(Debug, Serialize)]
struct NationsBody {
    count: usize,
    nations: Vec<Nation>,
}

#[derive(Debug, Serialize)]
struct NationBody {
    message: String,
    nation: Nation,
}

/// A cleared dangling reference has no nation to show.
#[derive(Debug, Serialize)]
struct LeaveBody {
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    nation: Option<Nation>,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct UserNationBody {
    #[serde(flatten)]
    view: UserNation,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct TerritoriesBody {
    count: usize,
    territories: Vec<TerritoryStatus>,
}

// --- Health ---

async fn health() -> &'static str {
    "OK"
}

// --- Identity ---

#[derive(Debug, Deserialize)]
struct WalletRequest {
    address: Option<String>,
}

async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<WalletRequest>, JsonRejection>,
) -> Reply<UserBody> {
    let req = body(payload)?;
    let address = present(req.address).ok_or(ApiError::MissingFields("Wallet address is required"))?;

    let user = state.identity.authenticate(&address).await?;
    ok(UserBody { user: user.into() })
}

// --- Nations: reads ---

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddressParams {
    address: Option<String>,
}

async fn list_nations(State(state): State<AppState>) -> Reply<NationsBody> {
    let nations = state.membership.list_nations(None).await?;
    ok(NationsBody {
        count: nations.len(),
        nations,
    })
}

async fn search_nations(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Reply<NationsBody> {
    let nations = state.membership.list_nations(params.q.as_deref()).await?;
    ok(NationsBody {
        count: nations.len(),
        nations,
    })
}

async fn user_nation(
    State(state): State<AppState>,
    Query(params): Query<AddressParams>,
) -> Reply<UserNationBody> {
    let address = present(params.address).ok_or(ApiError::MissingFields("Address is required"))?;

    let view = state.membership.user_nation(&address).await?;
    let message = (!view.has_nation).then_some("User does not belong to any nation");
    ok(UserNationBody { view, message })
}

async fn territories(State(state): State<AppState>) -> Reply<TerritoriesBody> {
    let territories = state.claims.territory_overview().await?;
    ok(TerritoriesBody {
        count: territories.len(),
        territories,
    })
}

// --- Nations: membership ---

#[derive(Debug, Deserialize)]
struct CreateRequest {
    name: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NationRequest {
    nation_id: Option<String>,
    address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimRequest {
    nation_id: Option<String>,
    address: Option<String>,
    territory: Option<String>,
}

async fn create_nation(
    State(state): State<AppState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> Reply<NationBody> {
    let req = body(payload)?;
    let (Some(name), Some(address)) = (present(req.name), present(req.address)) else {
        return Err(ApiError::MissingFields("Name and address are required"));
    };

    let nation = state.membership.create_nation(&address, &name).await?;
    ok(NationBody {
        message: "Nation created successfully".into(),
        nation,
    })
}

async fn join_nation(
    State(state): State<AppState>,
    payload: Result<Json<NationRequest>, JsonRejection>,
) -> Reply<NationBody> {
    let req = body(payload)?;
    let (Some(nation_id), Some(address)) = (present(req.nation_id), present(req.address)) else {
        return Err(ApiError::MissingFields("Nation ID and address are required"));
    };

    let nation_id = parse_nation_id(&nation_id)?;
    let nation = state.membership.join_nation(&address, nation_id).await?;
    ok(NationBody {
        message: "Successfully joined the nation".into(),
        nation,
    })
}

async fn leave_nation(
    State(state): State<AppState>,
    payload: Result<Json<WalletRequest>, JsonRejection>,
) -> Reply<LeaveBody> {
    let req = body(payload)?;
    let address = present(req.address).ok_or(ApiError::MissingFields("Address is required"))?;

    let nation = match state.membership.leave_nation(&address).await? {
        Departure::Left { nation } => Some(nation),
        Departure::ReferenceCleared => None,
    };
    ok(LeaveBody {
        message: "Successfully left the nation",
        nation,
    })
}

async fn delete_nation(
    State(state): State<AppState>,
    payload: Result<Json<NationRequest>, JsonRejection>,
) -> Reply<MessageBody> {
    let req = body(payload)?;
    let (Some(nation_id), Some(address)) = (present(req.nation_id), present(req.address)) else {
        return Err(ApiError::MissingFields("Nation ID and address are required"));
    };

    let nation_id = parse_nation_id(&nation_id)?;
    state.membership.delete_nation(nation_id, &address).await?;
    ok(MessageBody {
        message: "Nation deleted successfully",
    })
}

// --- Nations: territory ---

async fn claim_territory(
    State(state): State<AppState>,
    payload: Result<Json<ClaimRequest>, JsonRejection>,
) -> Reply<NationBody> {
    let req = body(payload)?;
    let (Some(nation_id), Some(address), Some(territory)) = (
        present(req.nation_id),
        present(req.address),
        present(req.territory),
    ) else {
        return Err(ApiError::MissingFields("Missing required fields"));
    };

    let nation_id = parse_nation_id(&nation_id)?;
    let nation = state
        .claims
        .claim_territory(nation_id, &address, &territory)
        .await?;
    let claimed = nation
        .territory
        .map(|t| t.to_string())
        .unwrap_or(territory);
    ok(NationBody {
        message: format!("Successfully claimed {claimed}"),
        nation,
    })
}
