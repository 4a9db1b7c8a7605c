//! Bet Engine.
//!
//! Applies a bet placement: balance pre-check, then a single guarded
//! atomic debit. No outcome row is written at bet time — a bet stays
//! provisional until the caller cashes out or busts client-side.

use sqlx::SqlitePool;
use tracing::info;

use crate::types::StarfallError;

pub struct BetEngine {
    pool: SqlitePool,
}

impl BetEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Debit `bet_amount` from the user's balance and return the new balance.
    ///
    /// The decrement carries its own `balance >= bet_amount` guard inside
    /// the UPDATE, so two concurrent bets cannot drive the balance negative.
    pub async fn place_bet(&self, user_id: i64, bet_amount: i64) -> Result<i64, StarfallError> {
        if bet_amount <= 0 {
            return Err(StarfallError::InvalidInput(
                "bet_amount must be positive".into(),
            ));
        }

        let balance: i64 = sqlx::query_scalar("SELECT balance FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StarfallError::UserNotFound(user_id))?;

        if balance < bet_amount {
            return Err(StarfallError::InsufficientFunds {
                needed: bet_amount,
                available: balance,
            });
        }

        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET balance = balance - ?1 WHERE id = ?2 AND balance >= ?1 RETURNING balance",
        )
        .bind(bet_amount)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        // Zero rows here means another request drained the balance between
        // the pre-check and the debit.
        let new_balance = updated.ok_or(StarfallError::InsufficientFunds {
            needed: bet_amount,
            available: balance,
        })?;

        info!(user_id, bet_amount, balance = new_balance, "Bet placed");
        Ok(new_balance)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
