//! # Credential API
//!
//! The five registry operations: issue, verify, share, revoke, history.
//!
//! Issuance computes the credential hash over the canonical claim
//! object; verification derives status in a fixed rule order and appends
//! one verification log row per call; revocation is terminal and
//! deactivates every share of the credential.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use opencred_core::{ContentDigest, CredentialStatus, CredentialType, Did, VerificationStatus};
use opencred_credential::{
    can_revoke, derive_verification_status, generate_credential_id, CredentialClaims, StatusInputs,
};
use opencred_crypto::generate_share_token;

use crate::auth::{CallerIdentity, OptionalCaller};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::{append_audit, append_verification};
use crate::state::{
    AppState, AuditRecord, CredentialRecord, InstitutionRecord, ProfileRecord, ShareRecord,
    VerificationRecord,
};

/// Build the credentials router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/credentials/issue", post(issue_credential))
        .route("/v1/credentials/verify", post(verify_credential))
        .route("/v1/credentials/share", post(share_credential))
        .route("/v1/credentials/revoke", post(revoke_credential))
        .route("/v1/credentials/history", get(credential_history))
}

// -- Issue --------------------------------------------------------------------

/// Request to issue a credential to a subject wallet.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialRequest {
    pub subject_wallet_address: String,
    #[schema(value_type = String)]
    pub credential_type: CredentialType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

impl Validate for IssueCredentialRequest {
    fn validate(&self) -> Result<(), String> {
        if self.subject_wallet_address.trim().is_empty() || self.title.trim().is_empty() {
            return Err(
                "Missing required fields: subjectWalletAddress, credentialType, title".to_string(),
            );
        }
        if self.title.len() > 255 {
            return Err("title must not exceed 255 characters".to_string());
        }
        Ok(())
    }
}

/// Public fields of a freshly issued credential.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
    pub id: Uuid,
    pub credential_id: String,
    pub credential_hash: String,
    pub issuer: String,
    pub issued_at: DateTime<Utc>,
    pub status: String,
}

/// Issue response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IssueResponse {
    pub success: bool,
    pub credential: IssuedCredential,
}

/// POST /v1/credentials/issue — Issue a credential.
///
/// The caller must own a verified institution; the subject is resolved
/// by wallet address. Exactly one credential row and one audit row are
/// written per successful call. The issued-counter update is a separate
/// operation, not joined transactionally with the insert.
#[utoipa::path(
    post,
    path = "/v1/credentials/issue",
    request_body = IssueCredentialRequest,
    responses(
        (status = 201, description = "Credential issued", body = IssueResponse),
        (status = 403, description = "Caller has no verified institution", body = crate::error::ErrorBody),
        (status = 404, description = "Subject not found", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn issue_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<IssueCredentialRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssueResponse>), AppError> {
    let profile = resolve_profile(&state, &caller)?;
    let institution = state
        .find_institution_by_profile(profile.id)
        .ok_or_else(|| {
            AppError::Forbidden(
                "Institution not found. You must register as an institution first.".to_string(),
            )
        })?;
    if !institution.is_verified {
        return Err(AppError::Forbidden(
            "Institution is not verified. Cannot issue credentials.".to_string(),
        ));
    }

    let req = extract_validated_json(body)?;

    let subject = state
        .find_profile_by_wallet(&req.subject_wallet_address)
        .ok_or_else(|| {
            AppError::NotFound(
                "Subject (student) not found with the provided wallet address".to_string(),
            )
        })?;

    let now = Utc::now();
    let credential_id = generate_credential_id(now);

    let claims = CredentialClaims {
        credential_id: credential_id.clone(),
        issuer_did: institution.institution_did.clone(),
        subject_did: subject.did.clone(),
        credential_type: req.credential_type,
        title: req.title.clone(),
        description: req.description.clone(),
        metadata: req.metadata.clone(),
        issued_at: now,
        valid_until: req.valid_until,
        issuer_name: institution.name.clone(),
    };
    let credential_hash = claims
        .digest()
        .map_err(|e| AppError::Internal(format!("claim canonicalization failed: {e}")))?;

    let record = CredentialRecord {
        id: Uuid::new_v4(),
        credential_id: credential_id.clone(),
        issuer_id: institution.id,
        subject_id: subject.id,
        credential_type: req.credential_type,
        title: req.title,
        description: req.description,
        credential_hash,
        metadata: req.metadata.unwrap_or_else(|| serde_json::json!({})),
        status: CredentialStatus::Active,
        issued_at: now,
        valid_until: req.valid_until,
        revoked_at: None,
        revocation_reason: None,
        blockchain_tx_hash: None,
        created_at: now,
        updated_at: now,
    };

    state.credentials.insert(record.id, record.clone());

    // Persist to database (write-through). Failure is surfaced to the
    // client because the in-memory record would be lost on restart.
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::credentials::insert(pool, &record).await {
            tracing::error!(credential_id = %credential_id, error = %e, "failed to persist credential");
            return Err(AppError::Internal(
                "credential recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    // Counter update is intentionally separate from the insert: a crash
    // between the two leaves the counter stale.
    let new_count = institution.total_credentials_issued + 1;
    state.institutions.update(&institution.id, |i| {
        i.total_credentials_issued = new_count;
        i.updated_at = now;
    });
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::institutions::set_issued_count(pool, institution.id, new_count).await
        {
            tracing::warn!(institution_id = %institution.id, error = %e, "failed to persist issued counter");
        }
    }

    append_audit(
        &state,
        AuditRecord {
            id: Uuid::new_v4(),
            actor_id: Some(profile.id),
            action: "credential_issued".to_string(),
            entity_type: "credential".to_string(),
            entity_id: Some(record.id),
            old_values: None,
            new_values: Some(serde_json::json!({
                "credentialId": credential_id.as_str(),
                "credentialType": req.credential_type.as_str(),
                "title": record.title,
                "subjectId": subject.id,
            })),
            created_at: now,
        },
    )
    .await;

    tracing::info!(credential_id = %credential_id, issuer = %institution.name, "Credential issued");

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            success: true,
            credential: IssuedCredential {
                id: record.id,
                credential_id: credential_id.as_str().to_string(),
                credential_hash: record.credential_hash.to_hex(),
                issuer: institution.name,
                issued_at: record.issued_at,
                status: record.status.as_str().to_string(),
            },
        }),
    ))
}

// -- Verify -------------------------------------------------------------------

/// Request to verify a credential by hash or identifier.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCredentialRequest {
    #[serde(default)]
    pub credential_hash: Option<String>,
    #[serde(default)]
    pub credential_id: Option<String>,
}

impl Validate for VerifyCredentialRequest {
    fn validate(&self) -> Result<(), String> {
        let has_hash = self
            .credential_hash
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        let has_id = self
            .credential_id
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if !has_hash && !has_id {
            return Err("Must provide either credentialHash or credentialId".to_string());
        }
        Ok(())
    }
}

/// Credential projection in verification responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CredentialView {
    pub credential_id: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub issued_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    pub credential_hash: String,
}

/// Issuer projection in verification responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuerView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    pub is_verified: bool,
    pub trust_score: i32,
}

/// Subject projection in verification responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubjectView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Verification metadata in responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationView {
    pub timestamp: DateTime<Utc>,
    pub time_ms: i64,
    pub blockchain_verified: bool,
    pub revocation_checked: bool,
}

/// Verify response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub verified: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<CredentialView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<IssuerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_time_ms: Option<i64>,
}

/// Build the credential/issuer/subject projections for a found
/// credential. Shared with share-token resolution.
pub(crate) fn credential_views(
    state: &AppState,
    credential: &CredentialRecord,
) -> (
    CredentialView,
    Option<IssuerView>,
    Option<SubjectView>,
    Option<InstitutionRecord>,
    Option<ProfileRecord>,
) {
    let issuer = state.institutions.get(&credential.issuer_id);
    let subject = state.profiles.get(&credential.subject_id);

    let credential_view = CredentialView {
        credential_id: credential.credential_id.as_str().to_string(),
        credential_type: credential.credential_type.as_str().to_string(),
        title: credential.title.clone(),
        description: credential.description.clone(),
        issued_at: credential.issued_at,
        valid_until: credential.valid_until,
        credential_hash: credential.credential_hash.to_hex(),
    };
    let issuer_view = issuer.as_ref().map(|i| IssuerView {
        name: i.name.clone(),
        did: i.institution_did.as_ref().map(|d| d.as_str().to_string()),
        is_verified: i.is_verified,
        trust_score: i.trust_score,
    });
    let subject_view = subject.as_ref().map(|s| SubjectView {
        did: s.did.as_ref().map(Did::as_str).map(str::to_string),
        display_name: s.display_name.clone(),
    });

    (credential_view, issuer_view, subject_view, issuer, subject)
}

/// Derive the verification status of a found credential at `now`.
/// Shared with share-token resolution.
pub(crate) fn derive_for_credential(
    credential: &CredentialRecord,
    issuer: Option<&InstitutionRecord>,
    now: DateTime<Utc>,
) -> opencred_credential::DerivedStatus {
    derive_verification_status(
        &StatusInputs {
            status: credential.status,
            valid_until: credential.valid_until,
            revoked_at: credential.revoked_at,
            revocation_reason: credential.revocation_reason.as_deref(),
            issuer_verified: issuer.map(|i| i.is_verified).unwrap_or(false),
        },
        now,
    )
}

/// POST /v1/credentials/verify — Verify a credential.
///
/// Anonymous or authenticated. Every call appends exactly one
/// verification log row, found or not.
#[utoipa::path(
    post,
    path = "/v1/credentials/verify",
    request_body = VerifyCredentialRequest,
    responses(
        (status = 200, description = "Verification result", body = VerifyResponse),
        (status = 400, description = "Neither hash nor identifier supplied", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn verify_credential(
    State(state): State<AppState>,
    caller: OptionalCaller,
    body: Result<Json<VerifyCredentialRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, AppError> {
    let start = Instant::now();
    let req = extract_validated_json(body)?;

    let by_hash = req.credential_hash.as_deref().filter(|s| !s.trim().is_empty());
    let by_id = req.credential_id.as_deref().filter(|s| !s.trim().is_empty());

    // Hash takes precedence when both are supplied.
    let credential = match by_hash {
        Some(raw) => ContentDigest::from_hex(raw)
            .ok()
            .and_then(|digest| state.find_credential_by_hash(&digest)),
        None => by_id.and_then(|cid| state.find_credential_by_cid(cid)),
    };

    let verifier_id = caller
        .0
        .and_then(|identity| identity.user_id())
        .and_then(|user_id| state.find_profile_by_user(user_id))
        .map(|p| p.id);

    let now = Utc::now();
    let verification_time_ms = start.elapsed().as_millis() as i64;

    let Some(credential) = credential else {
        let supplied = by_hash
            .or(by_id)
            .unwrap_or("unknown")
            .to_string();
        append_verification(
            &state,
            VerificationRecord {
                id: Uuid::new_v4(),
                credential_id: None,
                credential_hash: supplied,
                verifier_id,
                verification_status: VerificationStatus::Invalid,
                issuer_verified: false,
                blockchain_verified: false,
                revocation_checked: false,
                verification_time_ms,
                metadata: serde_json::json!({"reason": "Credential not found"}),
                created_at: now,
            },
        )
        .await;

        return Ok(Json(VerifyResponse {
            verified: false,
            status: VerificationStatus::Invalid.as_str().to_string(),
            reason: Some("Credential not found in registry".to_string()),
            credential: None,
            issuer: None,
            subject: None,
            verification: None,
            verification_time_ms: Some(verification_time_ms),
        }));
    };

    let (credential_view, issuer_view, subject_view, issuer, _subject) =
        credential_views(&state, &credential);
    let derived = derive_for_credential(&credential, issuer.as_ref(), now);

    append_verification(
        &state,
        VerificationRecord {
            id: Uuid::new_v4(),
            credential_id: Some(credential.id),
            credential_hash: credential.credential_hash.to_hex(),
            verifier_id,
            verification_status: derived.status,
            issuer_verified: issuer.as_ref().map(|i| i.is_verified).unwrap_or(false),
            blockchain_verified: credential.blockchain_tx_hash.is_some(),
            revocation_checked: true,
            verification_time_ms,
            metadata: serde_json::json!({
                "credentialId": credential.credential_id.as_str(),
                "issuerName": issuer.as_ref().map(|i| i.name.clone()),
            }),
            created_at: now,
        },
    )
    .await;

    tracing::info!(
        credential_id = %credential.credential_id,
        status = derived.status.as_str(),
        "Verification"
    );

    Ok(Json(VerifyResponse {
        verified: derived.status == VerificationStatus::Verified,
        status: derived.status.as_str().to_string(),
        reason: Some(derived.reason),
        credential: Some(credential_view),
        issuer: issuer_view,
        subject: subject_view,
        verification: Some(VerificationView {
            timestamp: now,
            time_ms: verification_time_ms,
            blockchain_verified: credential.blockchain_tx_hash.is_some(),
            revocation_checked: true,
        }),
        verification_time_ms: None,
    }))
}

// -- Share --------------------------------------------------------------------

/// Request to share an owned credential.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareCredentialRequest {
    pub credential_id: String,
    #[serde(default)]
    pub shared_with_wallet_address: Option<String>,
    #[serde(default)]
    pub expires_in_hours: Option<i64>,
    #[serde(default)]
    pub max_views: Option<i32>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub access_type: Option<opencred_core::AccessType>,
}

impl Validate for ShareCredentialRequest {
    fn validate(&self) -> Result<(), String> {
        if self.credential_id.trim().is_empty() {
            return Err("Missing required field: credentialId".to_string());
        }
        if matches!(self.expires_in_hours, Some(h) if h <= 0) {
            return Err("expiresInHours must be positive".to_string());
        }
        if matches!(self.max_views, Some(v) if v <= 0) {
            return Err("maxViews must be positive".to_string());
        }
        Ok(())
    }
}

/// Share projection returned to the owner.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShareView {
    pub id: Uuid,
    pub share_token: String,
    pub share_url: String,
    pub credential_id: String,
    pub credential_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_views: Option<i32>,
    pub access_type: String,
}

/// Share response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareResponse {
    pub success: bool,
    pub share: ShareView,
}

/// POST /v1/credentials/share — Share an owned credential.
#[utoipa::path(
    post,
    path = "/v1/credentials/share",
    request_body = ShareCredentialRequest,
    responses(
        (status = 201, description = "Share created", body = ShareResponse),
        (status = 403, description = "Caller does not own the credential", body = crate::error::ErrorBody),
        (status = 404, description = "Credential not found", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn share_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<ShareCredentialRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ShareResponse>), AppError> {
    let profile = resolve_profile(&state, &caller)?;
    let req = extract_validated_json(body)?;

    let credential = state
        .find_credential_by_cid(&req.credential_id)
        .ok_or_else(|| AppError::NotFound("Credential not found".to_string()))?;

    if credential.subject_id != profile.id {
        return Err(AppError::Forbidden(
            "You do not own this credential".to_string(),
        ));
    }

    let shared_with_id = req
        .shared_with_wallet_address
        .as_deref()
        .and_then(|addr| state.find_profile_by_wallet(addr))
        .map(|p| p.id);

    let now = Utc::now();
    let expires_at = req
        .expires_in_hours
        .map(|hours| now + chrono::Duration::hours(hours));

    let share_token = generate_share_token();
    let record = ShareRecord {
        id: Uuid::new_v4(),
        credential_id: credential.id,
        owner_id: profile.id,
        shared_with_id,
        share_token: share_token.clone(),
        access_type: req.access_type.unwrap_or_default(),
        expires_at,
        max_views: req.max_views,
        current_views: 0,
        is_active: true,
        created_at: now,
    };

    state.shares.insert(record.id, record.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::shares::insert(pool, &record).await {
            tracing::error!(share_id = %record.id, error = %e, "failed to persist share");
            return Err(AppError::Internal(
                "share recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    append_audit(
        &state,
        AuditRecord {
            id: Uuid::new_v4(),
            actor_id: Some(profile.id),
            action: "credential_shared".to_string(),
            entity_type: "credential_share".to_string(),
            entity_id: Some(record.id),
            old_values: None,
            new_values: Some(serde_json::json!({
                "credentialId": req.credential_id,
                "shareToken": share_token.as_str(),
                "expiresAt": expires_at,
                "maxViews": req.max_views,
                "sharedWithWalletAddress": req.shared_with_wallet_address,
            })),
            created_at: now,
        },
    )
    .await;

    let share_url = format!(
        "{}/verify?token={}",
        state.config.share_base_url,
        share_token.as_str()
    );

    tracing::info!(
        credential_id = %credential.credential_id,
        token_prefix = &share_token.as_str()[..8],
        "Credential shared"
    );

    Ok((
        StatusCode::CREATED,
        Json(ShareResponse {
            success: true,
            share: ShareView {
                id: record.id,
                share_token: share_token.as_str().to_string(),
                share_url,
                credential_id: credential.credential_id.as_str().to_string(),
                credential_title: credential.title,
                expires_at,
                max_views: req.max_views,
                access_type: record.access_type.as_str().to_string(),
            },
        }),
    ))
}

// -- Revoke -------------------------------------------------------------------

/// Request to revoke an issued credential.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokeCredentialRequest {
    pub credential_id: String,
    pub reason: String,
}

impl Validate for RevokeCredentialRequest {
    fn validate(&self) -> Result<(), String> {
        if self.credential_id.trim().is_empty() || self.reason.trim().is_empty() {
            return Err("Missing required fields: credentialId, reason".to_string());
        }
        Ok(())
    }
}

/// Revoke response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokeResponse {
    pub success: bool,
    pub credential_id: String,
    pub status: String,
    pub revoked_at: DateTime<Utc>,
    pub reason: String,
}

/// POST /v1/credentials/revoke — Revoke an issued credential.
///
/// Only the issuing institution may revoke. Revocation is terminal and
/// deactivates every share of the credential.
#[utoipa::path(
    post,
    path = "/v1/credentials/revoke",
    request_body = RevokeCredentialRequest,
    responses(
        (status = 200, description = "Credential revoked", body = RevokeResponse),
        (status = 400, description = "Already revoked", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not the issuer", body = crate::error::ErrorBody),
        (status = 404, description = "Credential not found", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn revoke_credential(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RevokeCredentialRequest>, JsonRejection>,
) -> Result<Json<RevokeResponse>, AppError> {
    let profile = resolve_profile(&state, &caller)?;
    let institution = state
        .find_institution_by_profile(profile.id)
        .ok_or_else(|| {
            AppError::Forbidden(
                "Institution not found. Only institutions can revoke credentials.".to_string(),
            )
        })?;

    let req = extract_validated_json(body)?;

    let credential = state
        .find_credential_by_cid(&req.credential_id)
        .ok_or_else(|| AppError::NotFound("Credential not found".to_string()))?;

    if credential.issuer_id != institution.id {
        return Err(AppError::Forbidden(
            "You can only revoke credentials issued by your institution".to_string(),
        ));
    }

    if !can_revoke(credential.status) {
        return Err(AppError::BadRequest(
            "Credential is already revoked".to_string(),
        ));
    }

    let now = Utc::now();
    state.credentials.update(&credential.id, |c| {
        c.status = CredentialStatus::Revoked;
        c.revoked_at = Some(now);
        c.revocation_reason = Some(req.reason.clone());
        c.updated_at = now;
    });

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::credentials::set_revoked(pool, credential.id, now, &req.reason).await
        {
            tracing::error!(credential_id = %credential.credential_id, error = %e, "failed to persist revocation");
            return Err(AppError::Internal(
                "revocation recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    // Cascade: deactivate every share referencing this credential.
    let deactivated = state.shares.update_where(
        |s| s.credential_id == credential.id,
        |s| s.is_active = false,
    );
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::shares::deactivate_for_credential(pool, credential.id).await {
            tracing::warn!(credential_id = %credential.credential_id, error = %e, "failed to persist share deactivation");
        }
    }

    append_audit(
        &state,
        AuditRecord {
            id: Uuid::new_v4(),
            actor_id: Some(profile.id),
            action: "credential_revoked".to_string(),
            entity_type: "credential".to_string(),
            entity_id: Some(credential.id),
            old_values: Some(serde_json::json!({"status": credential.status.as_str()})),
            new_values: Some(serde_json::json!({
                "status": "revoked",
                "reason": req.reason,
                "revokedAt": now,
            })),
            created_at: now,
        },
    )
    .await;

    tracing::info!(
        credential_id = %credential.credential_id,
        issuer = %institution.name,
        shares_deactivated = deactivated,
        "Credential revoked"
    );

    Ok(Json(RevokeResponse {
        success: true,
        credential_id: req.credential_id,
        status: CredentialStatus::Revoked.as_str().to_string(),
        revoked_at: now,
        reason: req.reason,
    }))
}

// -- History ------------------------------------------------------------------

/// Query parameters for the history listing.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// `student` (default) or `institution`.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Issuer projection in student history rows.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryIssuer {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_did: Option<String>,
    pub is_verified: bool,
    pub trust_score: i32,
}

/// Subject projection in institution history rows.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistorySubject {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

/// One credential row in the history listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryCredential {
    pub id: Uuid,
    pub credential_id: String,
    pub credential_type: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    pub issued_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<HistoryIssuer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<HistorySubject>,
    pub verification_count: usize,
}

/// Pagination envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

/// History response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HistoryResponse {
    pub credentials: Vec<HistoryCredential>,
    pub pagination: Pagination,
}

/// GET /v1/credentials/history — Paginated credential history.
///
/// Students see credentials they hold; institutions see credentials
/// they issued. Each row carries the verification count grouped from
/// the verification log. Pure read.
#[utoipa::path(
    get,
    path = "/v1/credentials/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Credential history", body = HistoryResponse),
        (status = 404, description = "Profile or institution not found", body = crate::error::ErrorBody),
    ),
    tag = "credentials"
)]
pub(crate) async fn credential_history(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let profile = resolve_profile(&state, &caller)?;

    let role = query.role.as_deref().unwrap_or("student");
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let mut credentials = if role == "institution" {
        let institution = state
            .find_institution_by_profile(profile.id)
            .ok_or_else(|| AppError::NotFound("Institution not found".to_string()))?;
        state
            .credentials
            .filter(|c| c.issuer_id == institution.id)
    } else {
        state.credentials.filter(|c| c.subject_id == profile.id)
    };
    credentials.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));

    let total = credentials.len();
    let page: Vec<CredentialRecord> = credentials
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    let rows = page
        .into_iter()
        .map(|c| {
            let verification_count = state.verification_count(c.id);
            let (issuer, subject) = if role == "institution" {
                let subject = state.profiles.get(&c.subject_id).map(|s| HistorySubject {
                    id: s.id,
                    display_name: s.display_name,
                    wallet_address: s.wallet_address.map(|w| w.as_str().to_string()),
                });
                (None, subject)
            } else {
                let issuer = state.institutions.get(&c.issuer_id).map(|i| HistoryIssuer {
                    id: i.id,
                    name: i.name,
                    institution_did: i.institution_did.map(|d| d.as_str().to_string()),
                    is_verified: i.is_verified,
                    trust_score: i.trust_score,
                });
                (issuer, None)
            };
            HistoryCredential {
                id: c.id,
                credential_id: c.credential_id.as_str().to_string(),
                credential_type: c.credential_type.as_str().to_string(),
                title: c.title,
                description: c.description,
                status: c.status.as_str().to_string(),
                issued_at: c.issued_at,
                valid_until: c.valid_until,
                revoked_at: c.revoked_at,
                revocation_reason: if role == "institution" {
                    c.revocation_reason
                } else {
                    None
                },
                credential_hash: if role == "institution" {
                    None
                } else {
                    Some(c.credential_hash.to_hex())
                },
                issuer,
                subject,
                verification_count,
            }
        })
        .collect();

    Ok(Json(HistoryResponse {
        credentials: rows,
        pagination: Pagination {
            total,
            limit,
            offset,
            has_more: (offset + limit) < total as i64,
        },
    }))
}

// -- Shared helpers -----------------------------------------------------------

/// Resolve the caller's profile, failing with the registry's standard
/// 404 when the user has none (or the caller is the service context,
/// which has no profile).
pub(crate) fn resolve_profile(
    state: &AppState,
    caller: &CallerIdentity,
) -> Result<ProfileRecord, AppError> {
    caller
        .user_id()
        .and_then(|user_id| state.find_profile_by_user(user_id))
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
}
