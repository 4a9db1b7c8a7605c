//! STARFALL — Telegram crash-game backend
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the SQLite ledger, and serves the HTTP API with graceful
//! shutdown.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use starfall::config;
use starfall::server::{self, AppState};
use starfall::storage;

const BANNER: &str = r#"
 ____ _____  _    ____  _____ _    _     _
/ ___|_   _|/ \  |  _ \|  ___/ \  | |   | |
\___ \ | | / _ \ | |_) | |_ / _ \ | |   | |
 ___) || |/ ___ \|  _ <|  _/ ___ \| |___| |___
|____/ |_/_/   \_\_| \_\_|/_/   \_\_____|_____|

  Telegram crash-game backend
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        host = %cfg.server.host,
        port = cfg.server.port,
        starting_balance = cfg.game.starting_balance,
        "STARFALL starting up"
    );

    let database_url = cfg.database.resolve_url();
    let pool = storage::connect(&database_url, cfg.database.max_connections).await?;
    storage::init_schema(&pool).await?;

    let state = Arc::new(AppState::new(pool, &cfg.game));
    server::serve(state, &cfg.server.host, cfg.server.port).await?;

    info!("STARFALL shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("starfall=info"));

    let json_logging = std::env::var("STARFALL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
