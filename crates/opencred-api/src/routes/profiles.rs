//! # Profile API
//!
//! Profile creation, lookup, and updates. A profile is created once per
//! authenticated user; linking a wallet address derives the profile's
//! DID (`did:opencred:<lowercase address>`).

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use opencred_core::{Did, UserRole, WalletAddress};

use crate::auth::CallerIdentity;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::{AppState, ProfileRecord, RoleGrant};

/// Build the profiles router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/profiles", post(create_profile))
        .route("/v1/profiles/me", get(get_my_profile))
        .route("/v1/profiles/me", put(update_my_profile))
}

/// Request to create the caller's profile.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Validate for CreateProfileRequest {
    fn validate(&self) -> Result<(), String> {
        if matches!(&self.display_name, Some(name) if name.len() > 255) {
            return Err("displayName must not exceed 255 characters".to_string());
        }
        Ok(())
    }
}

/// Request to update the caller's profile.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), String> {
        if matches!(&self.display_name, Some(name) if name.len() > 255) {
            return Err("displayName must not exceed 255 characters".to_string());
        }
        Ok(())
    }
}

/// Profile response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

fn profile_response(state: &AppState, profile: ProfileRecord) -> ProfileResponse {
    let roles = state
        .roles_for_user(profile.user_id)
        .into_iter()
        .map(|r| r.as_str().to_string())
        .collect();
    ProfileResponse {
        id: profile.id,
        user_id: profile.user_id,
        wallet_address: profile.wallet_address.map(|w| w.as_str().to_string()),
        did: profile.did.map(|d| d.as_str().to_string()),
        display_name: profile.display_name,
        avatar_url: profile.avatar_url,
        roles,
        created_at: profile.created_at,
    }
}

/// Parse and link a wallet address, deriving the DID.
fn parse_wallet(raw: &str) -> Result<(WalletAddress, Did), AppError> {
    let address = WalletAddress::new(raw).map_err(AppError::from)?;
    let did = Did::new(format!("did:opencred:{}", address.as_str()))
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok((address, did))
}

/// POST /v1/profiles — Create the caller's profile.
///
/// One profile per authenticated user; the default `student` role is
/// granted on creation.
#[utoipa::path(
    post,
    path = "/v1/profiles",
    request_body = CreateProfileRequest,
    responses(
        (status = 201, description = "Profile created", body = ProfileResponse),
        (status = 409, description = "Profile already exists", body = crate::error::ErrorBody),
    ),
    tag = "profiles"
)]
pub(crate) async fn create_profile(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateProfileRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProfileResponse>), AppError> {
    let user_id = caller.user_id().ok_or_else(|| {
        AppError::Forbidden("The service context has no profile".to_string())
    })?;

    if state.find_profile_by_user(user_id).is_some() {
        return Err(AppError::Conflict("Profile already exists".to_string()));
    }

    let req = extract_validated_json(body)?;

    let (wallet_address, did) = match req.wallet_address.as_deref() {
        Some(raw) => {
            let (address, did) = parse_wallet(raw)?;
            (Some(address), Some(did))
        }
        None => (None, None),
    };

    let now = Utc::now();
    let record = ProfileRecord {
        id: Uuid::new_v4(),
        user_id,
        wallet_address,
        did,
        display_name: req.display_name,
        avatar_url: req.avatar_url,
        created_at: now,
        updated_at: now,
    };

    state.profiles.insert(record.id, record.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::profiles::insert(pool, &record).await {
            tracing::error!(profile_id = %record.id, error = %e, "failed to persist profile");
            return Err(AppError::Internal(
                "profile recorded in-memory but database persist failed".to_string(),
            ));
        }
    }

    // Default role grant.
    if !state.has_role(user_id, UserRole::Student) {
        let grant = RoleGrant {
            id: Uuid::new_v4(),
            user_id,
            role: UserRole::Student,
            granted_by: None,
            granted_at: now,
        };
        state.roles.insert(grant.id, grant.clone());
        if let Some(pool) = &state.db_pool {
            if let Err(e) = crate::db::profiles::insert_role(pool, &grant).await {
                tracing::warn!(user_id = %user_id, error = %e, "failed to persist role grant");
            }
        }
    }

    tracing::info!(profile_id = %record.id, "Profile created");

    Ok((
        StatusCode::CREATED,
        Json(profile_response(&state, record)),
    ))
}

/// GET /v1/profiles/me — The caller's profile and roles.
#[utoipa::path(
    get,
    path = "/v1/profiles/me",
    responses(
        (status = 200, description = "Caller's profile", body = ProfileResponse),
        (status = 404, description = "Profile not found", body = crate::error::ErrorBody),
    ),
    tag = "profiles"
)]
pub(crate) async fn get_my_profile(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = crate::routes::credentials::resolve_profile(&state, &caller)?;
    Ok(Json(profile_response(&state, profile)))
}

/// PUT /v1/profiles/me — Update the caller's profile.
///
/// Linking (or re-linking) a wallet address rewrites the derived DID.
#[utoipa::path(
    put,
    path = "/v1/profiles/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 404, description = "Profile not found", body = crate::error::ErrorBody),
    ),
    tag = "profiles"
)]
pub(crate) async fn update_my_profile(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = crate::routes::credentials::resolve_profile(&state, &caller)?;
    let req = extract_validated_json(body)?;

    let wallet = match req.wallet_address.as_deref() {
        Some(raw) => Some(parse_wallet(raw)?),
        None => None,
    };

    let now = Utc::now();
    let updated = state
        .profiles
        .update(&profile.id, |p| {
            if let Some(name) = &req.display_name {
                p.display_name = Some(name.clone());
            }
            if let Some(url) = &req.avatar_url {
                p.avatar_url = Some(url.clone());
            }
            if let Some((address, did)) = &wallet {
                p.wallet_address = Some(address.clone());
                p.did = Some(did.clone());
            }
            p.updated_at = now;
        })
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::profiles::update(pool, &updated).await {
            tracing::error!(profile_id = %updated.id, error = %e, "failed to persist profile update");
            return Err(AppError::Internal(
                "profile updated in-memory but database persist failed".to_string(),
            ));
        }
    }

    Ok(Json(profile_response(&state, updated)))
}
