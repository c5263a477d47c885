//! Institution persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use opencred_core::Did;

use crate::state::InstitutionRecord;

/// Insert a new institution.
pub async fn insert(pool: &PgPool, record: &InstitutionRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO institutions (id, profile_id, name, website, country, accreditation_number,
         institution_did, is_verified, verified_at, trust_score, total_credentials_issued,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(record.id)
    .bind(record.profile_id)
    .bind(&record.name)
    .bind(&record.website)
    .bind(&record.country)
    .bind(&record.accreditation_number)
    .bind(record.institution_did.as_ref().map(Did::as_str))
    .bind(record.is_verified)
    .bind(record.verified_at)
    .bind(record.trust_score)
    .bind(record.total_credentials_issued)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Mark an institution verified.
pub async fn set_verified(
    pool: &PgPool,
    id: Uuid,
    verified_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE institutions SET is_verified = TRUE, verified_at = $1, updated_at = $2
         WHERE id = $3",
    )
    .bind(verified_at)
    .bind(verified_at)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Write the issued-credential counter.
///
/// The value is computed by the caller from its read of the record — the
/// read-then-write is intentionally not transactional with the
/// credential insert.
pub async fn set_issued_count(pool: &PgPool, id: Uuid, count: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE institutions SET total_credentials_issued = $1, updated_at = $2 WHERE id = $3",
    )
    .bind(count)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all institutions from the database into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<InstitutionRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, InstitutionRow>(
        "SELECT id, profile_id, name, website, country, accreditation_number, institution_did,
         is_verified, verified_at, trust_score, total_credentials_issued, created_at, updated_at
         FROM institutions ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match row.into_record() {
            Some(record) => records.push(record),
            None => {
                tracing::error!("skipping institution row with invalid institution_did");
            }
        }
    }
    Ok(records)
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct InstitutionRow {
    id: Uuid,
    profile_id: Uuid,
    name: String,
    website: Option<String>,
    country: Option<String>,
    accreditation_number: Option<String>,
    institution_did: Option<String>,
    is_verified: bool,
    verified_at: Option<DateTime<Utc>>,
    trust_score: i32,
    total_credentials_issued: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InstitutionRow {
    fn into_record(self) -> Option<InstitutionRecord> {
        let institution_did = match self.institution_did {
            Some(raw) => match Did::new(raw) {
                Ok(did) => Some(did),
                Err(e) => {
                    tracing::warn!(id = %self.id, error = %e, "invalid institution_did in institutions row");
                    return None;
                }
            },
            None => None,
        };
        Some(InstitutionRecord {
            id: self.id,
            profile_id: self.profile_id,
            name: self.name,
            website: self.website,
            country: self.country,
            accreditation_number: self.accreditation_number,
            institution_did,
            is_verified: self.is_verified,
            verified_at: self.verified_at,
            trust_score: self.trust_score,
            total_credentials_issued: self.total_credentials_issued,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
