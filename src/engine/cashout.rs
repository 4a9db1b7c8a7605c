//! Cashout Engine.
//!
//! Resolves a bet: computes winnings with decimal math, credits the
//! balance and appends the immutable game outcome in one transaction.

use chrono::Utc;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::info;

use crate::types::StarfallError;

/// Result of a successful cashout.
#[derive(Debug, Clone)]
pub struct CashoutReceipt {
    pub balance: i64,
    pub win_amount: i64,
    pub multiplier: f64,
}

pub struct CashoutEngine {
    pool: SqlitePool,
}

impl CashoutEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Credit `floor(bet_amount * multiplier)` and record the outcome.
    ///
    /// Both writes run in one transaction: a failed outcome insert rolls
    /// the credit back, and a credit touching zero rows aborts with
    /// `UserNotFound` before anything is committed.
    pub async fn cashout(
        &self,
        user_id: i64,
        bet_amount: i64,
        multiplier: f64,
        auto_cashout: bool,
    ) -> Result<CashoutReceipt, StarfallError> {
        if bet_amount <= 0 {
            return Err(StarfallError::InvalidInput(
                "bet_amount must be positive".into(),
            ));
        }
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(StarfallError::InvalidInput(
                "multiplier must be at least 1.0".into(),
            ));
        }

        let win_amount = win_amount(bet_amount, multiplier)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let balance: i64 = sqlx::query_scalar(
            "UPDATE users SET balance = balance + ?1, updated_at = ?2 WHERE id = ?3 RETURNING balance",
        )
        .bind(win_amount)
        .bind(now)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StarfallError::UserNotFound(user_id))?;

        sqlx::query(
            r#"
            INSERT INTO games (user_id, bet_amount, multiplier, win_amount, is_win, auto_cashout, created_at)
            VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)
            "#,
        )
        .bind(user_id)
        .bind(bet_amount)
        .bind(multiplier)
        .bind(win_amount)
        .bind(auto_cashout)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            user_id,
            bet_amount,
            multiplier,
            win_amount,
            balance,
            auto_cashout,
            "Cashout settled"
        );

        Ok(CashoutReceipt {
            balance,
            win_amount,
            multiplier,
        })
    }
}

/// `floor(bet_amount * multiplier)` in decimal space.
///
/// The floor is taken on the decimal product, so float representation
/// noise (1.001 stored as 1.0009999…) cannot shave a star off the payout.
fn win_amount(bet_amount: i64, multiplier: f64) -> Result<i64, StarfallError> {
    let multiplier = Decimal::from_f64(multiplier)
        .ok_or_else(|| StarfallError::InvalidInput("multiplier is not a number".into()))?;

    (Decimal::from(bet_amount) * multiplier)
        .floor()
        .to_i64()
        .ok_or_else(|| StarfallError::InvalidInput("win amount out of range".into()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
