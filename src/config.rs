//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The database URL is referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`, with a TOML fallback for
//! local development.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub game: GameConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Name of the environment variable holding the database URL.
    pub url_env: String,
    /// Used when the environment variable is not set.
    pub fallback_url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    /// Stars granted to a freshly created user.
    pub starting_balance: i64,
    pub leaderboard_size: i64,
    /// Row cap on the admin user listing.
    pub admin_list_cap: i64,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}

impl DatabaseConfig {
    /// The connection URL: environment first, TOML fallback second.
    pub fn resolve_url(&self) -> String {
        std::env::var(&self.url_env).unwrap_or_else(|_| self.fallback_url.clone())
    }
}
