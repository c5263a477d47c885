//! Audit log persistence operations.
//!
//! The audit log is append-only: there is deliberately no update or
//! delete here.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::state::AuditRecord;

/// Append an audit log row.
pub async fn insert(pool: &PgPool, record: &AuditRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_logs (id, actor_id, action, entity_type, entity_id, old_values,
         new_values, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id)
    .bind(record.actor_id)
    .bind(&record.action)
    .bind(&record.entity_type)
    .bind(record.entity_id)
    .bind(&record.old_values)
    .bind(&record.new_values)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all audit rows into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<AuditRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AuditRow>(
        "SELECT id, actor_id, action, entity_type, entity_id, old_values, new_values, created_at
         FROM audit_logs ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AuditRow::into_record).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct AuditRow {
    id: Uuid,
    actor_id: Option<Uuid>,
    action: String,
    entity_type: String,
    entity_id: Option<Uuid>,
    old_values: Option<serde_json::Value>,
    new_values: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl AuditRow {
    fn into_record(self) -> AuditRecord {
        AuditRecord {
            id: self.id,
            actor_id: self.actor_id,
            action: self.action,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            old_values: self.old_values,
            new_values: self.new_values,
            created_at: self.created_at,
        }
    }
}
