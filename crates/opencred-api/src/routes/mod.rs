//! # API Route Modules
//!
//! Route modules for the registry API surface:
//!
//! - `credentials` — issuance, verification, sharing, revocation, and
//!   history: the five registry operations.
//! - `shares` — public share-token resolution (the read path for share
//!   links).
//! - `profiles` — profile creation, lookup, and wallet linking.
//! - `institutions` — institution registration and administrative
//!   verification.

pub mod credentials;
pub mod institutions;
pub mod profiles;
pub mod shares;

use crate::state::{AppState, AuditRecord, VerificationRecord};

/// Append an audit log row to the store, with fire-and-forget database
/// write-through.
pub(crate) async fn append_audit(state: &AppState, record: AuditRecord) {
    state.audit_logs.insert(record.id, record.clone());
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::audit::insert(pool, &record).await {
            tracing::warn!(audit_id = %record.id, error = %e, "failed to persist audit log row");
        }
    }
}

/// Append a verification log row to the store, with fire-and-forget
/// database write-through.
pub(crate) async fn append_verification(state: &AppState, record: VerificationRecord) {
    state.verifications.insert(record.id, record.clone());
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::verifications::insert(pool, &record).await {
            tracing::warn!(verification_id = %record.id, error = %e, "failed to persist verification row");
        }
    }
}
