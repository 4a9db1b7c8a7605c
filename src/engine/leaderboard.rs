//! Leaderboard Aggregator.
//!
//! Read-only ranking over recorded outcomes. Users with no games still
//! appear with zero winnings, matching the game client's expectations.

use sqlx::SqlitePool;

use crate::types::{resolve_name, LeaderboardEntry, StarfallError};

#[derive(Debug, sqlx::FromRow)]
struct LeaderboardRow {
    username: Option<String>,
    first_name: Option<String>,
    max_multiplier: f64,
    total_wins: i64,
}

pub struct Leaderboard {
    pool: SqlitePool,
}

impl Leaderboard {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Top `limit` players by summed winning amounts.
    ///
    /// Ties keep user-id order so repeated reads are stable.
    pub async fn top_players(&self, limit: i64) -> Result<Vec<LeaderboardEntry>, StarfallError> {
        let rows: Vec<LeaderboardRow> = sqlx::query_as(
            r#"
            SELECT
                u.username,
                u.first_name,
                COALESCE(MAX(g.multiplier), 0.0) AS max_multiplier,
                COALESCE(SUM(CASE WHEN g.is_win THEN g.win_amount ELSE 0 END), 0) AS total_wins
            FROM users u
            LEFT JOIN games g ON u.id = g.user_id
            GROUP BY u.id, u.username, u.first_name
            ORDER BY total_wins DESC, u.id ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| LeaderboardEntry {
                name: resolve_name(row.first_name.as_deref(), row.username.as_deref())
                    .to_string(),
                stars: row.total_wins,
                multiplier: row.max_multiplier,
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
