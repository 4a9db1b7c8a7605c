//! HTTP server — axum router over the ledger and game engines.
//!
//! One permissive CORS layer for the whole surface (the Telegram
//! mini-app is served from a different origin); caller identity arrives
//! via the `X-User-Id` header and is only trusted after the admin gate.

pub mod error;
pub mod routes;

use anyhow::{Context, Result};
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::GameConfig;
use crate::engine::bet::BetEngine;
use crate::engine::cashout::CashoutEngine;
use crate::engine::leaderboard::Leaderboard;
use crate::ledger::Ledger;

/// Shared state accessible by all route handlers.
pub struct AppState {
    pub ledger: Ledger,
    pub bets: BetEngine,
    pub cashouts: CashoutEngine,
    pub leaderboard: Leaderboard,
    pub leaderboard_size: i64,
    pub admin_list_cap: i64,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(pool: SqlitePool, game: &GameConfig) -> Self {
        Self {
            ledger: Ledger::new(pool.clone(), game.starting_balance),
            bets: BetEngine::new(pool.clone()),
            cashouts: CashoutEngine::new(pool.clone()),
            leaderboard: Leaderboard::new(pool),
            leaderboard_size: game.leaderboard_size,
            admin_list_cap: game.admin_list_cap,
        }
    }
}

/// Build the axum router with all routes and middleware.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-user-id")])
        .max_age(Duration::from_secs(86_400));

    Router::new()
        .route("/api/auth", post(routes::auth_user))
        .route(
            "/api/game",
            get(routes::get_leaderboard).post(routes::game_action),
        )
        .route(
            "/api/admin",
            get(routes::admin_data)
                .post(routes::admin_set_balance)
                .put(routes::admin_set_admin),
        )
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn serve(state: SharedState, host: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received.");
        })
        .await
        .context("Server error")?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
