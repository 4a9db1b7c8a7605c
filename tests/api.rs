//! End-to-end API tests.
//!
//! Drives the real router against an in-memory SQLite ledger, covering
//! the full bet → cashout → leaderboard flow and the admin surface.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::ServiceExt;

use starfall::config::GameConfig;
use starfall::server::{build_router, AppState};
use starfall::storage;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// One connection only: every connection to `sqlite::memory:` is its own
/// private database.
async fn setup() -> (Router, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    storage::init_schema(&pool).await.expect("schema bootstrap");

    let game = GameConfig {
        starting_balance: 1000,
        leaderboard_size: 10,
        admin_list_cap: 100,
    };
    let app = build_router(Arc::new(AppState::new(pool.clone(), &game)));
    (app, pool)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = caller {
        builder = builder.header("x-user-id", id.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Authenticate a user and return its JSON profile.
async fn auth(app: &Router, telegram_id: i64, first_name: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth",
        None,
        Some(json!({
            "telegram_id": telegram_id,
            "username": format!("user{telegram_id}"),
            "first_name": first_name,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["user"].clone()
}

async fn set_balance_raw(pool: &SqlitePool, user_id: i64, balance: i64) {
    sqlx::query("UPDATE users SET balance = ?1 WHERE id = ?2")
        .bind(balance)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

async fn balance_of(pool: &SqlitePool, user_id: i64) -> i64 {
    sqlx::query_scalar("SELECT balance FROM users WHERE id = ?1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn promote_to_admin(pool: &SqlitePool, user_id: i64) {
    sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?1")
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_auth_creates_user_with_starting_balance() {
    let (app, _pool) = setup().await;

    let user = auth(&app, 42, "Sasha").await;

    assert_eq!(user["telegram_id"], 42);
    assert_eq!(user["balance"], 1000);
    assert_eq!(user["is_admin"], false);
    assert_eq!(user["first_name"], "Sasha");
}

#[tokio::test]
async fn test_auth_upsert_keeps_balance_and_admin() {
    let (app, pool) = setup().await;
    let user = auth(&app, 42, "Sasha").await;
    let user_id = user["id"].as_i64().unwrap();

    // Spend some stars, then re-authenticate with changed profile fields.
    let (status, _) = send(
        &app,
        "POST",
        "/api/game",
        None,
        Some(json!({ "action": "place_bet", "user_id": user_id, "bet_amount": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let again = auth(&app, 42, "Aleksandra").await;

    assert_eq!(again["id"], user_id);
    assert_eq!(again["balance"], 900, "upsert must not touch balance");
    assert_eq!(again["is_admin"], false);
    assert_eq!(again["first_name"], "Aleksandra");
    assert_eq!(balance_of(&pool, user_id).await, 900);
}

#[tokio::test]
async fn test_auth_requires_telegram_id() {
    let (app, _pool) = setup().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth",
        None,
        Some(json!({ "username": "ghost" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// ---------------------------------------------------------------------------
// Bet / cashout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_bet_then_cashout_scenario() {
    let (app, pool) = setup().await;
    let user = auth(&app, 1, "Sasha").await;
    let user_id = user["id"].as_i64().unwrap();
    set_balance_raw(&pool, user_id, 100).await;

    // All-in bet empties the balance without error.
    let (status, body) = send(
        &app,
        "POST",
        "/api/game",
        None,
        Some(json!({ "action": "place_bet", "user_id": user_id, "bet_amount": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "balance": 0, "bet_placed": true }));

    // Cashout at 2.5x pays floor(100 * 2.5) = 250.
    let (status, body) = send(
        &app,
        "POST",
        "/api/game",
        None,
        Some(json!({
            "action": "cashout",
            "user_id": user_id,
            "bet_amount": 100,
            "multiplier": 2.5,
            "auto_cashout": false,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["win_amount"], 250);
    assert_eq!(body["balance"], 250);
    assert_eq!(body["multiplier"], 2.5);

    let games: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(games, 1, "exactly one outcome record per cashout");
}

#[tokio::test]
async fn test_bet_insufficient_funds_leaves_balance() {
    let (app, pool) = setup().await;
    let user = auth(&app, 1, "Sasha").await;
    let user_id = user["id"].as_i64().unwrap();
    set_balance_raw(&pool, user_id, 50).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/game",
        None,
        Some(json!({ "action": "place_bet", "user_id": user_id, "bet_amount": 100 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Insufficient balance"));
    assert_eq!(balance_of(&pool, user_id).await, 50);
}

#[tokio::test]
async fn test_bet_unknown_user() {
    let (app, _pool) = setup().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/game",
        None,
        Some(json!({ "action": "place_bet", "user_id": 9999, "bet_amount": 100 })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_game_schema_mismatch_is_invalid_input() {
    let (app, _pool) = setup().await;
    auth(&app, 1, "Sasha").await;

    // Unknown action.
    let (status, body) = send(
        &app,
        "POST",
        "/api/game",
        None,
        Some(json!({ "action": "double_or_nothing", "user_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    // Missing multiplier.
    let (status, _) = send(
        &app,
        "POST",
        "/api/game",
        None,
        Some(json!({ "action": "cashout", "user_id": 1, "bet_amount": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Multiplier below 1.0.
    let (status, _) = send(
        &app,
        "POST",
        "/api/game",
        None,
        Some(json!({
            "action": "cashout",
            "user_id": 1,
            "bet_amount": 100,
            "multiplier": 0.5,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_leaderboard_orders_and_names() {
    let (app, pool) = setup().await;
    let low = auth(&app, 1, "Low").await["id"].as_i64().unwrap();
    let high = auth(&app, 2, "High").await["id"].as_i64().unwrap();
    set_balance_raw(&pool, low, 10_000).await;
    set_balance_raw(&pool, high, 10_000).await;

    for (user_id, multiplier) in [(low, 1.5), (high, 2.0), (high, 1.2)] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/game",
            None,
            Some(json!({
                "action": "cashout",
                "user_id": user_id,
                "bet_amount": 100,
                "multiplier": multiplier,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, "GET", "/api/game", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let board = body["leaderboard"].as_array().unwrap();
    assert_eq!(board[0]["name"], "High");
    assert_eq!(board[0]["stars"], 320);
    assert_eq!(board[0]["multiplier"], 2.0);
    assert_eq!(board[1]["name"], "Low");
    assert_eq!(board[1]["stars"], 150);
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_admin_gate() {
    let (app, pool) = setup().await;
    let caller = auth(&app, 1, "Plain").await["id"].as_i64().unwrap();
    let target = auth(&app, 2, "Target").await["id"].as_i64().unwrap();

    // No header at all.
    let (status, _) = send(&app, "GET", "/api/admin", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Non-admin caller: forbidden, and no mutation happens.
    let (status, body) = send(
        &app,
        "PUT",
        "/api/admin",
        Some(caller),
        Some(json!({ "user_id": target, "is_admin": true })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Admin access required");

    let target_flag: bool = sqlx::query_scalar("SELECT is_admin FROM users WHERE id = ?1")
        .bind(target)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(!target_flag, "forbidden request must not mutate the ledger");
}

#[tokio::test]
async fn test_admin_operations() {
    let (app, pool) = setup().await;
    let admin = auth(&app, 1, "Root").await["id"].as_i64().unwrap();
    let target = auth(&app, 2, "Target").await["id"].as_i64().unwrap();
    promote_to_admin(&pool, admin).await;

    // Listing plus aggregate stats.
    let (status, body) = send(&app, "GET", "/api/admin", Some(admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["stats"]["total_users"], 2);
    assert_eq!(body["stats"]["total_games"], 0);
    assert_eq!(body["stats"]["total_winnings"], 0);

    // Balance overwrite.
    let (status, body) = send(
        &app,
        "POST",
        "/api/admin",
        Some(admin),
        Some(json!({ "user_id": target, "balance": 5000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 5000);
    assert_eq!(balance_of(&pool, target).await, 5000);

    // Negative overwrite is rejected.
    let (status, _) = send(
        &app,
        "POST",
        "/api/admin",
        Some(admin),
        Some(json!({ "user_id": target, "balance": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Admin flag toggle.
    let (status, body) = send(
        &app,
        "PUT",
        "/api/admin",
        Some(admin),
        Some(json!({ "user_id": target, "is_admin": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_admin"], true);

    // Unknown target.
    let (status, _) = send(
        &app,
        "POST",
        "/api/admin",
        Some(admin),
        Some(json!({ "user_id": 9999, "balance": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
