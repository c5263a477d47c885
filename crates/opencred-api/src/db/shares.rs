//! Credential share persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use opencred_core::{AccessType, ShareToken};

use crate::state::ShareRecord;

/// Insert a new share.
pub async fn insert(pool: &PgPool, record: &ShareRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO credential_shares (id, credential_id, owner_id, shared_with_id, share_token,
         access_type, expires_at, max_views, current_views, is_active, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
    )
    .bind(record.id)
    .bind(record.credential_id)
    .bind(record.owner_id)
    .bind(record.shared_with_id)
    .bind(record.share_token.as_str())
    .bind(record.access_type.as_str())
    .bind(record.expires_at)
    .bind(record.max_views)
    .bind(record.current_views)
    .bind(record.is_active)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Deactivate every share referencing a credential. Returns the number
/// of rows touched.
pub async fn deactivate_for_credential(
    pool: &PgPool,
    credential_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE credential_shares SET is_active = FALSE WHERE credential_id = $1")
        .bind(credential_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Write a share's view counter.
pub async fn set_view_count(pool: &PgPool, id: Uuid, views: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE credential_shares SET current_views = $1 WHERE id = $2")
        .bind(views)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all shares from the database into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<ShareRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ShareRow>(
        "SELECT id, credential_id, owner_id, shared_with_id, share_token, access_type,
         expires_at, max_views, current_views, is_active, created_at
         FROM credential_shares ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match row.into_record() {
            Some(record) => records.push(record),
            None => {
                tracing::error!("skipping credential_shares row with invalid token or access_type");
            }
        }
    }
    Ok(records)
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ShareRow {
    id: Uuid,
    credential_id: Uuid,
    owner_id: Uuid,
    shared_with_id: Option<Uuid>,
    share_token: String,
    access_type: String,
    expires_at: Option<DateTime<Utc>>,
    max_views: Option<i32>,
    current_views: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl ShareRow {
    fn into_record(self) -> Option<ShareRecord> {
        let share_token = match ShareToken::new(self.share_token) {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "invalid share_token in credential_shares row");
                return None;
            }
        };
        let access_type = match AccessType::parse(&self.access_type) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(id = %self.id, error = %e, "invalid access_type in credential_shares row");
                return None;
            }
        };
        Some(ShareRecord {
            id: self.id,
            credential_id: self.credential_id,
            owner_id: self.owner_id,
            shared_with_id: self.shared_with_id,
            share_token,
            access_type,
            expires_at: self.expires_at,
            max_views: self.max_views,
            current_views: self.current_views,
            is_active: self.is_active,
            created_at: self.created_at,
        })
    }
}
