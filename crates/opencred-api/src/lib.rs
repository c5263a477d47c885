//! # opencred-api — Axum API Service for the OpenCred Registry
//!
//! The top of the workspace dependency DAG: assembles the registry's
//! route modules into a single application with shared middleware for
//! authentication, tracing, CORS, and metrics.
//!
//! ## API Surface
//!
//! | Prefix                      | Module                   | Access        |
//! |-----------------------------|--------------------------|---------------|
//! | `/v1/credentials/issue`     | [`routes::credentials`]  | institution   |
//! | `/v1/credentials/verify`    | [`routes::credentials`]  | anonymous ok  |
//! | `/v1/credentials/share`     | [`routes::credentials`]  | subject       |
//! | `/v1/credentials/revoke`    | [`routes::credentials`]  | issuer        |
//! | `/v1/credentials/history`   | [`routes::credentials`]  | authenticated |
//! | `/v1/shares/:token`         | [`routes::shares`]       | anonymous     |
//! | `/v1/profiles*`             | [`routes::profiles`]     | authenticated |
//! | `/v1/institutions*`         | [`routes::institutions`] | authenticated |
//! | `/health/*`, `/metrics`     | here                     | unauthenticated |
//! | `/openapi.json`             | [`openapi`]              | authenticated |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! CorsLayer → TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! CORS is permissive and handles `OPTIONS` preflight for every route.
//! The auth middleware resolves bearer tokens into a request-scoped
//! [`auth::CallerIdentity`]; anonymous requests pass through and are
//! rejected per-route by the extractor where an identity is required.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

pub use error::AppError;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) and `/metrics` are mounted outside the
/// auth middleware so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        secret: state.config.auth_secret.clone(),
    };
    let metrics = ApiMetrics::new();

    // Body size limit: 2 MiB. Prevents OOM from oversized request bodies.
    //
    // Middleware execution order (outermost → innermost):
    //   CorsLayer → TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
    let api = Router::new()
        .merge(routes::credentials::router())
        .merge(routes::shares::router())
        .merge(routes::profiles::router())
        .merge(routes::institutions::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(Extension(metrics.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(Extension(auth_config))
        .with_state(state.clone());

    // Unauthenticated health probes and metrics scrape endpoint.
    let unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .route("/metrics", axum::routing::get(prometheus_metrics))
        .layer(Extension(metrics))
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// GET /metrics — Prometheus metrics scrape endpoint.
///
/// Updates domain gauges from current `AppState` on each scrape (pull
/// model), then gathers and encodes all metrics in Prometheus text
/// exposition format.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    // Credentials by status.
    metrics.credentials_total().reset();
    for credential in state.credentials.list() {
        metrics
            .credentials_total()
            .with_label_values(&[credential.status.as_str()])
            .inc();
    }

    // Institutions by verification state.
    metrics.institutions_total().reset();
    for institution in state.institutions.list() {
        let label = if institution.is_verified { "true" } else { "false" };
        metrics
            .institutions_total()
            .with_label_values(&[label])
            .inc();
    }

    // Shares by state.
    metrics.shares_total().reset();
    for share in state.shares.list() {
        let label = if share.is_active { "true" } else { "false" };
        metrics.shares_total().with_label_values(&[label]).inc();
    }

    // Append-only log sizes.
    metrics
        .verifications_total()
        .set(state.verifications.len() as f64);
    metrics
        .audit_log_entries_total()
        .set(state.audit_logs.len() as f64);

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the application is ready to serve traffic.
///
/// Checks:
/// - In-memory stores are accessible.
/// - Database connection is healthy (when configured).
///
/// Returns 200 "ready" or 503 with a diagnostic message.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    // Verify stores are accessible (read lock acquirable).
    let _ = state.profiles.len();
    let _ = state.credentials.len();
    let _ = state.verifications.len();

    // Verify database connection (when configured).
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
