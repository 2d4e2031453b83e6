//! # slab-server
//!
//! HTTP service for the Slab City Legends site.
//!
//! This binary provides:
//! - **Public content API** for characters, locations, missions, companions,
//!   spirit guides, expansion decks, community cards and published stories
//! - **Intake forms** for stories, card ideas and companions, queued for
//!   moderation
//! - **Admin panel API**: password gate, submission moderation, per-session
//!   draft editors and whole-store backups
//! - **Community routes**: member accounts, message board, donations and
//!   the leaderboard
//! - **Per-IP rate limiting**, with a stricter bucket on logins

mod admin;
mod api;
mod auth;
mod community;
mod config;
mod error;
mod rate_limit;

use std::time::Duration;

use slab_store::Database;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,slab_server=debug")),
        )
        .init();

    info!("Starting Slab City Legends server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");
    if config.uses_fallback_password() {
        warn!("ADMIN_PASSWORD is not set; the development fallback password is accepted");
    }

    // -----------------------------------------------------------------------
    // 3. Open the store
    // -----------------------------------------------------------------------
    let mut db = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    info!(path = ?db.path(), "Database opened");

    if config.seed_defaults && db.seed_defaults()? {
        info!("Loaded default content");
    }

    let http_addr = config.http_addr;
    let app_state = AppState::new(db, config);

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Rate limiter cleanup (every 5 minutes, evict buckets idle >10 min)
    let limiters = [
        app_state.rate_limiter.clone(),
        app_state.login_limiter.clone(),
    ];
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            for limiter in &limiters {
                limiter.purge_stale(600.0).await;
            }
        }
    });

    // Expired sessions, and the drafts of admin sessions that lapsed
    let state = app_state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(600));
        loop {
            interval.tick().await;
            purge_sessions(&state).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

async fn purge_sessions(state: &AppState) {
    let mut editors = state.editors.lock().await;
    let db = state.db.lock().await;

    match db.purge_expired_sessions() {
        Ok(0) => {}
        Ok(n) => info!(purged = n, "Expired sessions removed"),
        Err(e) => {
            warn!(error = %e, "Session purge failed");
            return;
        }
    }
    editors.retain(|token, _| db.admin_session_valid(token).unwrap_or(false));
}
