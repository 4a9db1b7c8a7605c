//! Persistence layer.
//!
//! Owns the SQLite pool and bootstraps the schema at startup. All reads
//! and writes go through `sqlx`; the ledger and engines clone the pool.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Schema bootstrap, embedded at compile time.
const SCHEMA: &str = include_str!("schema.sql");

/// Open (creating if missing) the SQLite database behind `url`.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database URL: {url}"))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {url}"))?;

    info!(url, "Database pool ready");
    Ok(pool)
}

/// Create the users/games tables if they don't exist yet.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("Failed to initialise database schema")?;
    Ok(())
}

/// Fresh in-memory database for unit tests.
///
/// Capped at one connection: every connection to `sqlite::memory:` gets
/// its own private database, so a larger pool would split the schema
/// from the data.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    init_schema(&pool).await.expect("schema bootstrap");
    pool
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
