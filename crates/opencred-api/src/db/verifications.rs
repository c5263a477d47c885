//! Verification log persistence operations.
//!
//! The verification log is append-only: there is deliberately no update
//! or delete here.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use opencred_core::VerificationStatus;

use crate::state::VerificationRecord;

/// Append a verification log row.
pub async fn insert(pool: &PgPool, record: &VerificationRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO verifications (id, credential_id, credential_hash, verifier_id,
         verification_status, issuer_verified, blockchain_verified, revocation_checked,
         verification_time_ms, metadata, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(record.id)
    .bind(record.credential_id)
    .bind(&record.credential_hash)
    .bind(record.verifier_id)
    .bind(record.verification_status.as_str())
    .bind(record.issuer_verified)
    .bind(record.blockchain_verified)
    .bind(record.revocation_checked)
    .bind(record.verification_time_ms)
    .bind(&record.metadata)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all verification rows into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<VerificationRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, VerificationRow>(
        "SELECT id, credential_id, credential_hash, verifier_id, verification_status,
         issuer_verified, blockchain_verified, revocation_checked, verification_time_ms,
         metadata, created_at
         FROM verifications ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match row.into_record() {
            Some(record) => records.push(record),
            None => {
                tracing::error!("skipping verifications row with unknown verification_status");
            }
        }
    }
    Ok(records)
}

fn parse_status(s: &str) -> Option<VerificationStatus> {
    match s {
        "verified" => Some(VerificationStatus::Verified),
        "invalid" => Some(VerificationStatus::Invalid),
        "revoked" => Some(VerificationStatus::Revoked),
        "expired" => Some(VerificationStatus::Expired),
        "pending" => Some(VerificationStatus::Pending),
        other => {
            tracing::warn!(status = other, "unknown verification status in database");
            None
        }
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct VerificationRow {
    id: Uuid,
    credential_id: Option<Uuid>,
    credential_hash: String,
    verifier_id: Option<Uuid>,
    verification_status: String,
    issuer_verified: bool,
    blockchain_verified: bool,
    revocation_checked: bool,
    verification_time_ms: i64,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl VerificationRow {
    fn into_record(self) -> Option<VerificationRecord> {
        let verification_status = parse_status(&self.verification_status)?;
        Some(VerificationRecord {
            id: self.id,
            credential_id: self.credential_id,
            credential_hash: self.credential_hash,
            verifier_id: self.verifier_id,
            verification_status,
            issuer_verified: self.issuer_verified,
            blockchain_verified: self.blockchain_verified,
            revocation_checked: self.revocation_checked,
            verification_time_ms: self.verification_time_ms,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}
