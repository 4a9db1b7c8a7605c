//! User Ledger — identity and balance storage.
//!
//! Owns all direct user-row access: the Telegram auth upsert, lookups
//! for the admin gate, and the privileged admin reads and overwrites.
//! Balance mutations driven by gameplay live in `engine` instead.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::types::{AdminStats, StarfallError, User};

/// Profile fields asserted by the Telegram client at login.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthProfile {
    pub telegram_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

pub struct Ledger {
    pool: SqlitePool,
    starting_balance: i64,
}

impl Ledger {
    pub fn new(pool: SqlitePool, starting_balance: i64) -> Self {
        Self {
            pool,
            starting_balance,
        }
    }

    /// Create or refresh a user from Telegram identity fields.
    ///
    /// Profile fields and `updated_at` follow the caller on every call;
    /// `balance` and `is_admin` are only set on first insert, so repeating
    /// an identical call never touches money or privileges.
    pub async fn upsert_user(&self, profile: &AuthProfile) -> Result<User, StarfallError> {
        if profile.telegram_id <= 0 {
            return Err(StarfallError::InvalidInput(
                "telegram_id is required".into(),
            ));
        }

        let user: User = sqlx::query_as(
            r#"
            INSERT INTO users (telegram_id, username, first_name, last_name, balance, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(telegram_id) DO UPDATE SET
                username   = excluded.username,
                first_name = excluded.first_name,
                last_name  = excluded.last_name,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(profile.telegram_id)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(self.starting_balance)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(
            user_id = user.id,
            telegram_id = user.telegram_id,
            balance = user.balance,
            "User authenticated"
        );
        Ok(user)
    }

    /// Look up a user by internal id.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, StarfallError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Whether `user_id` resolves to a user with the admin flag set.
    pub async fn is_admin(&self, user_id: i64) -> Result<bool, StarfallError> {
        let flag: Option<bool> = sqlx::query_scalar("SELECT is_admin FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(flag.unwrap_or(false))
    }

    /// Newest-first user listing for the admin panel.
    pub async fn list_users(&self, limit: i64) -> Result<Vec<User>, StarfallError> {
        let users = sqlx::query_as(
            "SELECT * FROM users ORDER BY created_at DESC, id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    /// Aggregate counters for the admin panel.
    pub async fn stats(&self) -> Result<AdminStats, StarfallError> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let total_games: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games")
            .fetch_one(&self.pool)
            .await?;
        let total_winnings: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(win_amount), 0) FROM games WHERE is_win = 1",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminStats {
            total_users,
            total_games,
            total_winnings,
        })
    }

    /// Admin overwrite of a user's balance.
    pub async fn set_balance(&self, user_id: i64, balance: i64) -> Result<i64, StarfallError> {
        if balance < 0 {
            return Err(StarfallError::InvalidInput(
                "balance must not be negative".into(),
            ));
        }

        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET balance = ?1, updated_at = ?2 WHERE id = ?3 RETURNING balance",
        )
        .bind(balance)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let new_balance = updated.ok_or(StarfallError::UserNotFound(user_id))?;
        info!(user_id, balance = new_balance, "Balance overwritten by admin");
        Ok(new_balance)
    }

    /// Admin overwrite of a user's admin flag.
    pub async fn set_admin(&self, user_id: i64, is_admin: bool) -> Result<bool, StarfallError> {
        let updated: Option<bool> = sqlx::query_scalar(
            "UPDATE users SET is_admin = ?1, updated_at = ?2 WHERE id = ?3 RETURNING is_admin",
        )
        .bind(is_admin)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let flag = updated.ok_or(StarfallError::UserNotFound(user_id))?;
        info!(user_id, is_admin = flag, "Admin flag overwritten");
        Ok(flag)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
