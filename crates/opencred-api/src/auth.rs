//! # Authentication Middleware
//!
//! Bearer-token authentication with a shared service secret, checked in
//! constant time.
//!
//! ## Token forms
//!
//! With `OPENCRED_AUTH_SECRET` configured:
//!
//! - `Bearer <user-id>:<secret>` — authenticates as the given user.
//! - `Bearer <secret>` — the administrative service context (no user
//!   profile; used for institution verification).
//!
//! Without a configured secret (dev and test mode):
//!
//! - `Bearer <user-id>` — authenticates as the given user.
//! - `Bearer admin` — the administrative context.
//!
//! A request with no `Authorization` header proceeds anonymously; routes
//! that need an identity reject with 401 via the [`CallerIdentity`]
//! extractor. A present-but-invalid header is rejected with 401 at the
//! middleware, before any handler runs. Health probes and `/metrics` are
//! mounted outside this middleware entirely.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::error::AppError;

/// A shared secret that zeroizes on drop and compares in constant time.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// Constant-time equality against a candidate value.
    pub fn verify(&self, candidate: &str) -> bool {
        let ours = self.0.as_bytes();
        let theirs = candidate.as_bytes();
        if ours.len() != theirs.len() {
            return false;
        }
        ours.ct_eq(theirs).into()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(***)")
    }
}

/// Auth configuration injected as a request extension.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub secret: Option<SecretString>,
}

/// The authenticated caller, inserted into request extensions by
/// [`auth_middleware`] and read by handlers through the extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerIdentity {
    /// An authenticated end user.
    User { user_id: Uuid },
    /// The administrative service context.
    Admin,
}

impl CallerIdentity {
    /// The user id, if this caller is an end user.
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::User { user_id } => Some(*user_id),
            Self::Admin => None,
        }
    }

    /// Whether this caller is the administrative context.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))
    }
}

/// Optional caller identity for routes that serve anonymous requests.
#[derive(Debug, Clone, Copy)]
pub struct OptionalCaller(pub Option<CallerIdentity>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalCaller
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<CallerIdentity>().copied()))
    }
}

/// Parse and validate a bearer token value against the configuration.
fn identify(token: &str, config: &AuthConfig) -> Result<CallerIdentity, AppError> {
    match &config.secret {
        Some(secret) => {
            if secret.verify(token) {
                return Ok(CallerIdentity::Admin);
            }
            if let Some((user_part, secret_part)) = token.split_once(':') {
                if !secret.verify(secret_part) {
                    return Err(AppError::Unauthorized("Invalid token".to_string()));
                }
                let user_id = Uuid::parse_str(user_part)
                    .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;
                return Ok(CallerIdentity::User { user_id });
            }
            Err(AppError::Unauthorized("Invalid token".to_string()))
        }
        None => {
            if token == "admin" {
                return Ok(CallerIdentity::Admin);
            }
            let user_id = Uuid::parse_str(token)
                .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;
            Ok(CallerIdentity::User { user_id })
        }
    }
}

/// Tower middleware: resolve the caller identity from the
/// `Authorization` header.
///
/// Anonymous requests pass through without an identity; malformed or
/// invalid tokens are rejected immediately.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let config = request
        .extensions()
        .get::<AuthConfig>()
        .cloned()
        .unwrap_or_default();

    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if let Some(header) = header {
        let Some(token) = header.strip_prefix("Bearer ") else {
            return AppError::Unauthorized("Invalid authorization header".to_string())
                .into_response();
        };
        match identify(token, &config) {
            Ok(identity) => {
                request.extensions_mut().insert(identity);
            }
            Err(err) => return err.into_response(),
        }
    }

    next.run(request).await
}
