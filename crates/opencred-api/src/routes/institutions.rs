//! # Institution API
//!
//! Institution registration (1:1 with a profile) and the administrative
//! verification endpoint. `is_verified` gates credential issuance; only
//! the service context may flip it.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use opencred_core::{Did, UserRole};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::credentials::resolve_profile;
use crate::state::{AppState, InstitutionRecord, RoleGrant};

/// Build the institutions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/institutions", post(register_institution))
        .route("/v1/institutions/me", get(get_my_institution))
        .route("/v1/institutions/:id/verify", post(verify_institution))
}

/// Request to register an institution for the caller's profile.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInstitutionRequest {
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub accreditation_number: Option<String>,
}

impl Validate for RegisterInstitutionRequest {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Missing required field: name".to_string());
        }
        if self.name.len() > 255 {
            return Err("name must not exceed 255 characters".to_string());
        }
        Ok(())
    }
}

/// Institution response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionResponse {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accreditation_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institution_did: Option<String>,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    pub trust_score: i32,
    pub total_credentials_issued: i64,
    pub created_at: DateTime<Utc>,
}

impl From<InstitutionRecord> for InstitutionResponse {
    fn from(record: InstitutionRecord) -> Self {
        Self {
            id: record.id,
            profile_id: record.profile_id,
            name: record.name,
            website: record.website,
            country: record.country,
            accreditation_number: record.accreditation_number,
            institution_did: record.institution_did.map(|d| d.as_str().to_string()),
            is_verified: record.is_verified,
            verified_at: record.verified_at,
            trust_score: record.trust_score,
            total_credentials_issued: record.total_credentials_issued,
            created_at: record.created_at,
        }
    }
}

/// POST /v1/institutions — Register an institution.
///
/// One institution per profile. Registration grants the `institution`
/// role; the institution starts unverified and cannot issue until an
/// administrator verifies it.
#[utoipa::path(
    post,
    path = "/v1/institutions",
    request_body = RegisterInstitutionRequest,
    responses(
        (status = 201, description = "Institution registered", body = InstitutionResponse),
        (status = 404, description = "Profile not found", body = crate::error::ErrorBody),
        (status = 409, description = "Institution already registered", body = crate::error::ErrorBody),
    ),
    tag = "institutions"
)]
pub(crate) async fn register_institution(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<RegisterInstitutionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InstitutionResponse>), AppError> {
    let profile = resolve_profile(&state, &caller)?;

    if state.find_institution_by_profile(profile.id).is_some() {
        return Err(AppError::Conflict(
            "Institution already registered".to_string(),
        ));
    }

    let req = extract_validated_json(body)?;

    let now = Utc::now();
    let id = Uuid::new_v4();
    let institution_did = Did::new(format!("did:opencred:inst-{id}"))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let record = InstitutionRecord {
        id,
        profile_id: profile.id,
        name: req.name,
        website: req.website,
        country: req.country,
        accreditation_number: req.accreditation_number,
        institution_did: Some(institution_did),
        is_verified: false,
        verified_at: None,
        trust_score: 0,
        total_credentials_issued: 0,
        created_at: now,
        updated_at: now,
    };

    state.institutions.insert(record.id, record.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::institutions::insert(pool, &record).await {
            tracing::error!(institution_id = %record.id, error = %e, "failed to persist institution");
            return Err(AppError::Internal(
                "institution recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    if !state.has_role(profile.user_id, UserRole::Institution) {
        let grant = RoleGrant {
            id: Uuid::new_v4(),
            user_id: profile.user_id,
            role: UserRole::Institution,
            granted_by: None,
            granted_at: now,
        };
        state.roles.insert(grant.id, grant.clone());
        if let Some(pool) = &state.db_pool {
            if let Err(e) = crate::db::profiles::insert_role(pool, &grant).await {
                tracing::warn!(user_id = %profile.user_id, error = %e, "failed to persist role grant");
            }
        }
    }

    tracing::info!(institution_id = %record.id, name = %record.name, "Institution registered");

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// GET /v1/institutions/me — The caller's institution.
#[utoipa::path(
    get,
    path = "/v1/institutions/me",
    responses(
        (status = 200, description = "Caller's institution", body = InstitutionResponse),
        (status = 404, description = "Institution not found", body = crate::error::ErrorBody),
    ),
    tag = "institutions"
)]
pub(crate) async fn get_my_institution(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<InstitutionResponse>, AppError> {
    let profile = resolve_profile(&state, &caller)?;
    let institution = state
        .find_institution_by_profile(profile.id)
        .ok_or_else(|| AppError::NotFound("Institution not found".to_string()))?;
    Ok(Json(institution.into()))
}

/// POST /v1/institutions/:id/verify — Mark an institution verified.
///
/// Administrative service context only. Stands in for the out-of-band
/// governance approval process.
#[utoipa::path(
    post,
    path = "/v1/institutions/{id}/verify",
    params(("id" = Uuid, Path, description = "Institution ID")),
    responses(
        (status = 200, description = "Institution verified", body = InstitutionResponse),
        (status = 403, description = "Administrator access required", body = crate::error::ErrorBody),
        (status = 404, description = "Institution not found", body = crate::error::ErrorBody),
    ),
    tag = "institutions"
)]
pub(crate) async fn verify_institution(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<InstitutionResponse>, AppError> {
    if !caller.is_admin() {
        return Err(AppError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }

    let now = Utc::now();
    let updated = state
        .institutions
        .update(&id, |i| {
            if !i.is_verified {
                i.is_verified = true;
                i.verified_at = Some(now);
                i.updated_at = now;
            }
        })
        .ok_or_else(|| AppError::NotFound("Institution not found".to_string()))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) =
            crate::db::institutions::set_verified(pool, id, updated.verified_at.unwrap_or(now)).await
        {
            tracing::error!(institution_id = %id, error = %e, "failed to persist verification");
            return Err(AppError::Internal(
                "institution verified in-memory but database persist failed".to_string(),
            ));
        }
    }

    tracing::info!(institution_id = %id, name = %updated.name, "Institution verified");

    Ok(Json(updated.into()))
}
