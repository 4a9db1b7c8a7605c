//! Shared types for the Starfall backend.
//!
//! The data model used across the ledger, the game engines, and the
//! HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// One row of the user ledger.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Internal id, referenced by outcomes and the `X-User-Id` header.
    pub id: i64,
    /// Stable Telegram id asserted by the mini-app client.
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Star balance. Non-negative; bets pre-check before debiting.
    pub balance: i64,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name with the same fallback chain the leaderboard uses.
    pub fn display_name(&self) -> &str {
        resolve_name(self.first_name.as_deref(), self.username.as_deref())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (id {}, tg {}): {}★",
            self.display_name(),
            self.id,
            self.telegram_id,
            self.balance,
        )
    }
}

/// Name fallback chain: first name, then username, then "Anonymous".
/// Empty strings count as missing, like the Telegram client sends them.
pub fn resolve_name<'a>(first_name: Option<&'a str>, username: Option<&'a str>) -> &'a str {
    first_name
        .filter(|s| !s.is_empty())
        .or(username.filter(|s| !s.is_empty()))
        .unwrap_or("Anonymous")
}

// ---------------------------------------------------------------------------
// Game outcome
// ---------------------------------------------------------------------------

/// Immutable record of one resolved bet.
///
/// Created only by the cashout engine; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GameOutcome {
    pub id: i64,
    pub user_id: i64,
    pub bet_amount: i64,
    pub multiplier: f64,
    /// `floor(bet_amount * multiplier)`, fixed at cashout time.
    pub win_amount: i64,
    pub is_win: bool,
    /// Whether the client's auto-cashout trigger fired rather than the player.
    pub auto_cashout: bool,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// One leaderboard row, in client wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    /// Total stars won across winning games.
    pub stars: i64,
    /// Best multiplier ever hit.
    pub multiplier: f64,
}

/// Aggregate counters shown on the admin panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_games: i64,
    pub total_winnings: i64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for Starfall.
#[derive(Debug, thiserror::Error)]
pub enum StarfallError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Insufficient balance: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("Identity required: {0}")]
    Unauthorized(String),

    #[error("Admin access required")]
    Forbidden,

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
