//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the Bearer token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "Bearer token authentication. The shared secret is set via \
                             the OPENCRED_AUTH_SECRET env var.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "OpenCred Registry API",
        version = "0.3.2",
        description = "Academic credential registry: institutions issue hashed credential \
                       records to student profiles, students share them via opaque tokens, \
                       and anyone can verify a credential by hash or identifier.\n\n\
                       Verification (`/v1/credentials/verify`) and share resolution \
                       (`/v1/shares/{token}`) accept anonymous callers; every other \
                       `/v1/*` endpoint requires a bearer token. Health probes \
                       (`/health/*`) and `/metrics` are unauthenticated.",
        license(name = "Apache-2.0")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // ── Credentials ─────────────────────────────────────────────────
        crate::routes::credentials::issue_credential,
        crate::routes::credentials::verify_credential,
        crate::routes::credentials::share_credential,
        crate::routes::credentials::revoke_credential,
        crate::routes::credentials::credential_history,
        // ── Shares ──────────────────────────────────────────────────────
        crate::routes::shares::resolve_share,
        // ── Profiles ────────────────────────────────────────────────────
        crate::routes::profiles::create_profile,
        crate::routes::profiles::get_my_profile,
        crate::routes::profiles::update_my_profile,
        // ── Institutions ────────────────────────────────────────────────
        crate::routes::institutions::register_institution,
        crate::routes::institutions::get_my_institution,
        crate::routes::institutions::verify_institution,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::routes::credentials::IssueCredentialRequest,
        crate::routes::credentials::IssuedCredential,
        crate::routes::credentials::IssueResponse,
        crate::routes::credentials::VerifyCredentialRequest,
        crate::routes::credentials::VerifyResponse,
        crate::routes::credentials::CredentialView,
        crate::routes::credentials::IssuerView,
        crate::routes::credentials::SubjectView,
        crate::routes::credentials::VerificationView,
        crate::routes::credentials::ShareCredentialRequest,
        crate::routes::credentials::ShareView,
        crate::routes::credentials::ShareResponse,
        crate::routes::credentials::RevokeCredentialRequest,
        crate::routes::credentials::RevokeResponse,
        crate::routes::credentials::HistoryCredential,
        crate::routes::credentials::HistoryIssuer,
        crate::routes::credentials::HistorySubject,
        crate::routes::credentials::Pagination,
        crate::routes::credentials::HistoryResponse,
        crate::routes::shares::ShareAccessView,
        crate::routes::shares::ResolveShareResponse,
        crate::routes::profiles::CreateProfileRequest,
        crate::routes::profiles::UpdateProfileRequest,
        crate::routes::profiles::ProfileResponse,
        crate::routes::institutions::RegisterInstitutionRequest,
        crate::routes::institutions::InstitutionResponse,
    )),
    tags(
        (name = "credentials", description = "Credential issuance, verification, sharing, revocation, history"),
        (name = "shares", description = "Public share-token resolution"),
        (name = "profiles", description = "Profile management and wallet linking"),
        (name = "institutions", description = "Institution registration and verification"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — the assembled spec.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
