//! # opencred-api entry point
//!
//! Reads configuration from the environment, connects to Postgres when
//! `DATABASE_URL` is set (hydrating the in-memory stores), and serves
//! the Axum application.
//!
//! ## Environment
//!
//! - `OPENCRED_PORT` — TCP port (default 8080).
//! - `OPENCRED_AUTH_SECRET` — shared bearer secret; unset enables dev
//!   mode authentication.
//! - `OPENCRED_SHARE_BASE_URL` — base URL for generated share links.
//! - `DATABASE_URL` — optional Postgres connection string.
//! - `RUST_LOG` — tracing filter (default `info`).

use tracing_subscriber::EnvFilter;

use opencred_api::auth::SecretString;
use opencred_api::state::{AppConfig, AppState};
use opencred_api::{app, db};

fn config_from_env() -> AppConfig {
    let defaults = AppConfig::default();
    let port = std::env::var("OPENCRED_PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(defaults.port);
    let auth_secret = std::env::var("OPENCRED_AUTH_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .map(SecretString::new);
    let share_base_url = std::env::var("OPENCRED_SHARE_BASE_URL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or(defaults.share_base_url);

    AppConfig {
        port,
        auth_secret,
        share_base_url,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config_from_env();
    if config.auth_secret.is_none() {
        tracing::warn!(
            "OPENCRED_AUTH_SECRET not set — dev mode authentication is active. \
             Do not run this configuration in production."
        );
    }

    let pool = db::init_pool().await?;
    let state = AppState::with_config(config, pool);

    if let Some(pool) = state.db_pool.clone() {
        db::load_state(&pool, &state).await?;
    }

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], state.config.port));
    tracing::info!(%addr, "OpenCred registry API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
