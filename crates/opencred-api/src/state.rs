//! # Application State
//!
//! Shared state for the Axum application: configuration, the in-memory
//! record stores, and the optional Postgres pool.
//!
//! The stores are the source of truth for request handling. When a pool
//! is configured, every mutation is written through to Postgres and the
//! stores are hydrated from it at startup, so state survives restarts.
//! Without a pool the API runs in-memory only (dev and test mode).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sqlx::PgPool;
use uuid::Uuid;

use opencred_core::{
    AccessType, CredentialId, CredentialStatus, CredentialType, Did, ShareToken, UserRole,
    VerificationStatus, WalletAddress,
};

use crate::auth::SecretString;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port the server binds.
    pub port: u16,
    /// Shared bearer secret. `None` disables secret checking (dev mode).
    pub auth_secret: Option<SecretString>,
    /// Base URL embedded in generated share links.
    pub share_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_secret: None,
            share_base_url: "http://localhost:8080".to_string(),
        }
    }
}

/// A user profile. One per authenticated user; optionally linked to a
/// wallet address with a derived DID.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub wallet_address: Option<WalletAddress>,
    pub did: Option<Did>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A role granted to a user.
#[derive(Debug, Clone)]
pub struct RoleGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
    pub granted_by: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
}

/// An issuing institution, 1:1 with a profile. `is_verified` gates
/// issuance and is flipped by the administrative verify endpoint.
#[derive(Debug, Clone)]
pub struct InstitutionRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub country: Option<String>,
    pub accreditation_number: Option<String>,
    pub institution_did: Option<Did>,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub trust_score: i32,
    pub total_credentials_issued: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An issued credential. `credential_hash` is the digest of the
/// canonical claim object; `blockchain_tx_hash` is a dormant placeholder
/// that no code path writes.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub id: Uuid,
    pub credential_id: CredentialId,
    pub issuer_id: Uuid,
    pub subject_id: Uuid,
    pub credential_type: CredentialType,
    pub title: String,
    pub description: Option<String>,
    pub credential_hash: opencred_core::ContentDigest,
    pub metadata: serde_json::Value,
    pub status: CredentialStatus,
    pub issued_at: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revocation_reason: Option<String>,
    pub blockchain_tx_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A share grant created by a credential's subject.
#[derive(Debug, Clone)]
pub struct ShareRecord {
    pub id: Uuid,
    pub credential_id: Uuid,
    pub owner_id: Uuid,
    pub shared_with_id: Option<Uuid>,
    pub share_token: ShareToken,
    pub access_type: AccessType,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<i32>,
    pub current_views: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One row per verification attempt. Append-only.
#[derive(Debug, Clone)]
pub struct VerificationRecord {
    pub id: Uuid,
    pub credential_id: Option<Uuid>,
    /// The looked-up hash, or whatever identifier the caller supplied
    /// when nothing was found.
    pub credential_hash: String,
    pub verifier_id: Option<Uuid>,
    pub verification_status: VerificationStatus,
    pub issuer_verified: bool,
    pub blockchain_verified: bool,
    pub revocation_checked: bool,
    pub verification_time_ms: i64,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// One row per audited mutation. Append-only.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub old_values: Option<serde_json::Value>,
    pub new_values: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Concurrent keyed record store.
///
/// Clones share the underlying map. Reads clone records out; writers
/// hold the lock only for the duration of the closure.
#[derive(Debug)]
pub struct Store<T>(Arc<RwLock<HashMap<Uuid, T>>>);

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone> Store<T> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self(Arc::new(RwLock::new(HashMap::new())))
    }

    /// Insert or replace a record.
    pub fn insert(&self, id: Uuid, record: T) {
        self.0.write().insert(id, record);
    }

    /// Fetch a record by id.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.0.read().get(id).cloned()
    }

    /// Mutate a record in place. Returns the updated record, or `None`
    /// when the id is absent.
    pub fn update<F: FnOnce(&mut T)>(&self, id: &Uuid, f: F) -> Option<T> {
        let mut guard = self.0.write();
        let record = guard.get_mut(id)?;
        f(record);
        Some(record.clone())
    }

    /// Mutate every record matching the predicate. Returns the number of
    /// records touched.
    pub fn update_where<P, F>(&self, pred: P, mut f: F) -> usize
    where
        P: Fn(&T) -> bool,
        F: FnMut(&mut T),
    {
        let mut guard = self.0.write();
        let mut touched = 0;
        for record in guard.values_mut() {
            if pred(record) {
                f(record);
                touched += 1;
            }
        }
        touched
    }

    /// First record matching the predicate.
    pub fn find<P: Fn(&T) -> bool>(&self, pred: P) -> Option<T> {
        self.0.read().values().find(|r| pred(r)).cloned()
    }

    /// All records matching the predicate.
    pub fn filter<P: Fn(&T) -> bool>(&self, pred: P) -> Vec<T> {
        self.0.read().values().filter(|r| pred(r)).cloned().collect()
    }

    /// All records.
    pub fn list(&self) -> Vec<T> {
        self.0.read().values().cloned().collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.0.read().is_empty()
    }
}

impl<T: Clone> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared application state passed to all route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub profiles: Store<ProfileRecord>,
    pub roles: Store<RoleGrant>,
    pub institutions: Store<InstitutionRecord>,
    pub credentials: Store<CredentialRecord>,
    pub shares: Store<ShareRecord>,
    pub verifications: Store<VerificationRecord>,
    pub audit_logs: Store<AuditRecord>,
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Create state with default configuration and no database.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// Create state with explicit configuration and an optional pool.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            config,
            profiles: Store::new(),
            roles: Store::new(),
            institutions: Store::new(),
            credentials: Store::new(),
            shares: Store::new(),
            verifications: Store::new(),
            audit_logs: Store::new(),
            db_pool,
        }
    }

    /// Profile for an authenticated user id.
    pub fn find_profile_by_user(&self, user_id: Uuid) -> Option<ProfileRecord> {
        self.profiles.find(|p| p.user_id == user_id)
    }

    /// Profile by normalized (lowercase) wallet address.
    pub fn find_profile_by_wallet(&self, address: &str) -> Option<ProfileRecord> {
        let needle = address.to_lowercase();
        self.profiles
            .find(|p| p.wallet_address.as_ref().map(WalletAddress::as_str) == Some(needle.as_str()))
    }

    /// Institution owned by a profile.
    pub fn find_institution_by_profile(&self, profile_id: Uuid) -> Option<InstitutionRecord> {
        self.institutions.find(|i| i.profile_id == profile_id)
    }

    /// Credential by human-readable identifier.
    pub fn find_credential_by_cid(&self, credential_id: &str) -> Option<CredentialRecord> {
        self.credentials
            .find(|c| c.credential_id.as_str() == credential_id)
    }

    /// Credential by hex claim digest.
    pub fn find_credential_by_hash(
        &self,
        hash: &opencred_core::ContentDigest,
    ) -> Option<CredentialRecord> {
        self.credentials.find(|c| c.credential_hash == *hash)
    }

    /// Share by token string.
    pub fn find_share_by_token(&self, token: &str) -> Option<ShareRecord> {
        self.shares.find(|s| s.share_token.as_str() == token)
    }

    /// Number of verification log rows referencing a credential row.
    pub fn verification_count(&self, credential_row_id: Uuid) -> usize {
        self.verifications
            .filter(|v| v.credential_id == Some(credential_row_id))
            .len()
    }

    /// Roles granted to a user.
    pub fn roles_for_user(&self, user_id: Uuid) -> Vec<UserRole> {
        let mut roles: Vec<UserRole> = self
            .roles
            .filter(|r| r.user_id == user_id)
            .into_iter()
            .map(|r| r.role)
            .collect();
        roles.sort_by_key(|r| r.as_str());
        roles.dedup();
        roles
    }

    /// Whether a user holds a role.
    pub fn has_role(&self, user_id: Uuid, role: UserRole) -> bool {
        self.roles
            .find(|r| r.user_id == user_id && r.role == role)
            .is_some()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(user_id: Uuid, wallet: Option<&str>) -> ProfileRecord {
        let now = Utc::now();
        ProfileRecord {
            id: Uuid::new_v4(),
            user_id,
            wallet_address: wallet.map(|w| WalletAddress::new(w).unwrap()),
            did: None,
            display_name: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn store_insert_get_update() {
        let store: Store<ProfileRecord> = Store::new();
        let p = profile(Uuid::new_v4(), None);
        let id = p.id;
        store.insert(id, p);
        assert!(store.get(&id).is_some());

        let updated = store.update(&id, |p| p.display_name = Some("Ada".to_string()));
        assert_eq!(updated.unwrap().display_name.as_deref(), Some("Ada"));
        assert!(store.update(&Uuid::new_v4(), |_| {}).is_none());
    }

    #[test]
    fn store_update_where_counts_touched() {
        let store: Store<ProfileRecord> = Store::new();
        for _ in 0..3 {
            let p = profile(Uuid::new_v4(), None);
            store.insert(p.id, p);
        }
        let touched = store.update_where(
            |_| true,
            |p| p.display_name = Some("x".to_string()),
        );
        assert_eq!(touched, 3);
    }

    #[test]
    fn wallet_lookup_is_case_insensitive() {
        let state = AppState::new();
        let addr = format!("0x{}", "ab".repeat(20));
        let p = profile(Uuid::new_v4(), Some(&addr));
        state.profiles.insert(p.id, p);

        let upper = format!("0x{}", "AB".repeat(20));
        assert!(state.find_profile_by_wallet(&upper).is_some());
    }

    #[test]
    fn roles_dedup_and_lookup() {
        let state = AppState::new();
        let user = Uuid::new_v4();
        for role in [UserRole::Student, UserRole::Student, UserRole::Institution] {
            let grant = RoleGrant {
                id: Uuid::new_v4(),
                user_id: user,
                role,
                granted_by: None,
                granted_at: Utc::now(),
            };
            state.roles.insert(grant.id, grant);
        }
        assert_eq!(state.roles_for_user(user).len(), 2);
        assert!(state.has_role(user, UserRole::Institution));
        assert!(!state.has_role(user, UserRole::Admin));
    }
}
