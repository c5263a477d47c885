//! # Database Persistence Layer
//!
//! Postgres persistence for the registry via SQLx.
//!
//! ## Architecture
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, the
//! API persists profiles, roles, institutions, credentials, shares,
//! verification log rows, and audit log rows to PostgreSQL, and hydrates
//! the in-memory stores from it at startup. When absent, the API
//! operates in in-memory-only mode (suitable for development and
//! testing).
//!
//! ## Write-through policy
//!
//! Primary-record inserts and state transitions (profiles, institutions,
//! credentials, shares) surface persistence failures to the client as
//! 500s — the in-memory record would otherwise be lost on restart.
//! Secondary appends and counters (verification log, audit log, issued
//! counter, share view counter) log a warning and continue, matching the
//! fire-and-forget writes of the original handlers.

pub mod audit;
pub mod credentials;
pub mod institutions;
pub mod profiles;
pub mod shares;
pub mod verifications;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::state::AppState;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set — running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Hydrate the in-memory stores from the database at startup.
pub async fn load_state(pool: &PgPool, state: &AppState) -> Result<(), sqlx::Error> {
    for record in profiles::load_all(pool).await? {
        state.profiles.insert(record.id, record);
    }
    for record in profiles::load_all_roles(pool).await? {
        state.roles.insert(record.id, record);
    }
    for record in institutions::load_all(pool).await? {
        state.institutions.insert(record.id, record);
    }
    for record in credentials::load_all(pool).await? {
        state.credentials.insert(record.id, record);
    }
    for record in shares::load_all(pool).await? {
        state.shares.insert(record.id, record);
    }
    for record in verifications::load_all(pool).await? {
        state.verifications.insert(record.id, record);
    }
    for record in audit::load_all(pool).await? {
        state.audit_logs.insert(record.id, record);
    }

    tracing::info!(
        profiles = state.profiles.len(),
        institutions = state.institutions.len(),
        credentials = state.credentials.len(),
        shares = state.shares.len(),
        verifications = state.verifications.len(),
        "State loaded from database"
    );
    Ok(())
}
