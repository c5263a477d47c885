//! Credential persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use opencred_core::{ContentDigest, CredentialId, CredentialStatus, CredentialType};

use crate::state::CredentialRecord;

/// Insert a new credential.
pub async fn insert(pool: &PgPool, record: &CredentialRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO credentials (id, credential_id, issuer_id, subject_id, credential_type,
         title, description, credential_hash, metadata, status, issued_at, valid_until,
         revoked_at, revocation_reason, blockchain_tx_hash, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
    )
    .bind(record.id)
    .bind(record.credential_id.as_str())
    .bind(record.issuer_id)
    .bind(record.subject_id)
    .bind(record.credential_type.as_str())
    .bind(&record.title)
    .bind(&record.description)
    .bind(record.credential_hash.to_hex())
    .bind(&record.metadata)
    .bind(record.status.as_str())
    .bind(record.issued_at)
    .bind(record.valid_until)
    .bind(record.revoked_at)
    .bind(&record.revocation_reason)
    .bind(&record.blockchain_tx_hash)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist a revocation.
pub async fn set_revoked(
    pool: &PgPool,
    id: Uuid,
    revoked_at: DateTime<Utc>,
    reason: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE credentials SET status = 'revoked', revoked_at = $1, revocation_reason = $2,
         updated_at = $3 WHERE id = $4",
    )
    .bind(revoked_at)
    .bind(reason)
    .bind(revoked_at)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all credentials from the database into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<CredentialRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CredentialRow>(
        "SELECT id, credential_id, issuer_id, subject_id, credential_type, title, description,
         credential_hash, metadata, status, issued_at, valid_until, revoked_at,
         revocation_reason, blockchain_tx_hash, created_at, updated_at
         FROM credentials ORDER BY issued_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match row.into_record() {
            Some(record) => records.push(record),
            None => {
                tracing::error!("skipping credentials row with invalid type, status, or hash");
            }
        }
    }
    Ok(records)
}

fn parse_status(s: &str) -> Option<CredentialStatus> {
    match s {
        "active" => Some(CredentialStatus::Active),
        "revoked" => Some(CredentialStatus::Revoked),
        "expired" => Some(CredentialStatus::Expired),
        "pending" => Some(CredentialStatus::Pending),
        other => {
            tracing::warn!(status = other, "unknown credential status in database");
            None
        }
    }
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    credential_id: String,
    issuer_id: Uuid,
    subject_id: Uuid,
    credential_type: String,
    title: String,
    description: Option<String>,
    credential_hash: String,
    metadata: serde_json::Value,
    status: String,
    issued_at: DateTime<Utc>,
    valid_until: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
    revocation_reason: Option<String>,
    blockchain_tx_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CredentialRow {
    fn into_record(self) -> Option<CredentialRecord> {
        let credential_type = match CredentialType::parse(&self.credential_type) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "invalid credential_type in credentials row");
                return None;
            }
        };
        let status = parse_status(&self.status)?;
        let credential_hash = match ContentDigest::from_hex(&self.credential_hash) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "invalid credential_hash in credentials row");
                return None;
            }
        };
        let credential_id = match CredentialId::new(self.credential_id) {
            Ok(cid) => cid,
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "invalid credential_id in credentials row");
                return None;
            }
        };
        Some(CredentialRecord {
            id: self.id,
            credential_id,
            issuer_id: self.issuer_id,
            subject_id: self.subject_id,
            credential_type,
            title: self.title,
            description: self.description,
            credential_hash,
            metadata: self.metadata,
            status,
            issued_at: self.issued_at,
            valid_until: self.valid_until,
            revoked_at: self.revoked_at,
            revocation_reason: self.revocation_reason,
            blockchain_tx_hash: self.blockchain_tx_hash,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
