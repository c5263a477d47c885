//! # Share Resolution API
//!
//! The public read path for share links. A share token resolves to the
//! same verification view `verify-credential` produces, gated by the
//! share's active flag, expiry, and view limit. Resolution counts a
//! view.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use opencred_core::VerificationStatus;
use opencred_credential::ShareGate;

use crate::error::AppError;
use crate::routes::credentials::{
    credential_views, derive_for_credential, CredentialView, IssuerView, SubjectView,
};
use crate::state::AppState;

/// Build the shares router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/shares/:token", get(resolve_share))
}

/// Share access metadata returned alongside the verification view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareAccessView {
    pub access_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_views: Option<i32>,
    pub current_views: i32,
}

/// Share resolution response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveShareResponse {
    pub verified: bool,
    pub status: String,
    pub reason: String,
    pub credential: CredentialView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<IssuerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectView>,
    pub share: ShareAccessView,
}

/// GET /v1/shares/:token — Resolve a share token.
///
/// Unauthenticated. Unknown tokens are 404; known but inactive, expired,
/// or view-exhausted shares are 403. A successful resolution increments
/// the share's view counter.
#[utoipa::path(
    get,
    path = "/v1/shares/{token}",
    params(("token" = String, Path, description = "Share token")),
    responses(
        (status = 200, description = "Share resolved", body = ResolveShareResponse),
        (status = 403, description = "Share no longer usable", body = crate::error::ErrorBody),
        (status = 404, description = "Share not found", body = crate::error::ErrorBody),
    ),
    tag = "shares"
)]
pub(crate) async fn resolve_share(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ResolveShareResponse>, AppError> {
    let share = state
        .find_share_by_token(&token)
        .ok_or_else(|| AppError::NotFound("Share not found".to_string()))?;

    let now = Utc::now();
    let gate = ShareGate {
        is_active: share.is_active,
        expires_at: share.expires_at,
        max_views: share.max_views,
        current_views: share.current_views,
    };
    gate.evaluate(now)
        .map_err(|denied| AppError::Forbidden(denied.to_string()))?;

    let credential = state
        .credentials
        .get(&share.credential_id)
        .ok_or_else(|| AppError::NotFound("Credential not found".to_string()))?;

    // Count the view. The counter write-through is fire-and-forget,
    // like the original's untracked counter updates.
    let updated = state
        .shares
        .update(&share.id, |s| s.current_views += 1)
        .map(|s| s.current_views)
        .unwrap_or(share.current_views + 1);
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::shares::set_view_count(pool, share.id, updated).await {
            tracing::warn!(share_id = %share.id, error = %e, "failed to persist share view count");
        }
    }

    let (credential_view, issuer_view, subject_view, issuer, _subject) =
        credential_views(&state, &credential);
    let derived = derive_for_credential(&credential, issuer.as_ref(), now);

    tracing::info!(
        credential_id = %credential.credential_id,
        status = derived.status.as_str(),
        "Share resolved"
    );

    Ok(Json(ResolveShareResponse {
        verified: derived.status == VerificationStatus::Verified,
        status: derived.status.as_str().to_string(),
        reason: derived.reason,
        credential: credential_view,
        issuer: issuer_view,
        subject: subject_view,
        share: ShareAccessView {
            access_type: share.access_type.as_str().to_string(),
            expires_at: share.expires_at,
            max_views: share.max_views,
            current_views: updated,
        },
    }))
}
