//! Route handlers.
//!
//! Request/response shapes mirror the Telegram mini-app client. POST
//! bodies arrive as raw JSON and are run through serde here, so a schema
//! mismatch surfaces as `InvalidInput` instead of a framework rejection.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ledger::AuthProfile;
use crate::server::error::ApiError;
use crate::server::SharedState;
use crate::types::{AdminStats, LeaderboardEntry, StarfallError, User};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
}

/// Game actions share one endpoint; the `action` tag selects the engine.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GameRequest {
    PlaceBet {
        user_id: i64,
        bet_amount: i64,
    },
    Cashout {
        user_id: i64,
        bet_amount: i64,
        multiplier: f64,
        #[serde(default)]
        auto_cashout: bool,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GameResponse {
    BetPlaced {
        balance: i64,
        bet_placed: bool,
    },
    CashedOut {
        balance: i64,
        win_amount: i64,
        multiplier: f64,
    },
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize)]
pub struct AdminDataResponse {
    pub users: Vec<User>,
    pub stats: AdminStats,
}

#[derive(Debug, Deserialize)]
pub struct SetBalanceRequest {
    pub user_id: i64,
    pub balance: i64,
}

#[derive(Debug, Serialize)]
pub struct SetBalanceResponse {
    pub balance: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetAdminRequest {
    pub user_id: i64,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct SetAdminResponse {
    pub is_admin: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Decode a JSON body into `T`, mapping any mismatch to `InvalidInput`.
fn decode<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| StarfallError::InvalidInput(e.to_string()).into())
}

/// Resolve the `X-User-Id` header to an admin user or reject.
///
/// Missing/malformed header is 401; a resolvable caller without the
/// admin flag (or an unknown id) is 403, checked before any admin
/// operation runs.
async fn require_admin(state: &SharedState, headers: &HeaderMap) -> Result<i64, ApiError> {
    let caller: i64 = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| StarfallError::Unauthorized("X-User-Id header required".into()))?
        .parse()
        .map_err(|_| StarfallError::Unauthorized("X-User-Id must be a user id".into()))?;

    if !state.ledger.is_admin(caller).await? {
        return Err(StarfallError::Forbidden.into());
    }
    Ok(caller)
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /api/auth — create or refresh a user from Telegram identity.
pub async fn auth_user(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<AuthResponse>, ApiError> {
    let profile: AuthProfile = decode(body)?;
    let user = state.ledger.upsert_user(&profile).await?;
    Ok(Json(AuthResponse { user }))
}

/// POST /api/game — place a bet or cash out.
pub async fn game_action(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<Json<GameResponse>, ApiError> {
    match decode::<GameRequest>(body)? {
        GameRequest::PlaceBet {
            user_id,
            bet_amount,
        } => {
            let balance = state.bets.place_bet(user_id, bet_amount).await?;
            Ok(Json(GameResponse::BetPlaced {
                balance,
                bet_placed: true,
            }))
        }
        GameRequest::Cashout {
            user_id,
            bet_amount,
            multiplier,
            auto_cashout,
        } => {
            let receipt = state
                .cashouts
                .cashout(user_id, bet_amount, multiplier, auto_cashout)
                .await?;
            Ok(Json(GameResponse::CashedOut {
                balance: receipt.balance,
                win_amount: receipt.win_amount,
                multiplier: receipt.multiplier,
            }))
        }
    }
}

/// GET /api/game — leaderboard.
pub async fn get_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let leaderboard = state.leaderboard.top_players(state.leaderboard_size).await?;
    Ok(Json(LeaderboardResponse { leaderboard }))
}

/// GET /api/admin — user list plus aggregate stats.
pub async fn admin_data(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<AdminDataResponse>, ApiError> {
    require_admin(&state, &headers).await?;
    let users = state.ledger.list_users(state.admin_list_cap).await?;
    let stats = state.ledger.stats().await?;
    Ok(Json(AdminDataResponse { users, stats }))
}

/// POST /api/admin — overwrite a user's balance.
pub async fn admin_set_balance(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<SetBalanceResponse>, ApiError> {
    require_admin(&state, &headers).await?;
    let req: SetBalanceRequest = decode(body)?;
    let balance = state.ledger.set_balance(req.user_id, req.balance).await?;
    Ok(Json(SetBalanceResponse { balance }))
}

/// PUT /api/admin — overwrite a user's admin flag.
pub async fn admin_set_admin(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<SetAdminResponse>, ApiError> {
    require_admin(&state, &headers).await?;
    let req: SetAdminRequest = decode(body)?;
    let is_admin = state.ledger.set_admin(req.user_id, req.is_admin).await?;
    Ok(Json(SetAdminResponse { is_admin }))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
