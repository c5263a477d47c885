//! Profile and role persistence operations.
//!
//! All functions take a `&PgPool` and operate on the `profiles` and
//! `user_roles` tables.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use opencred_core::{Did, UserRole, WalletAddress};

use crate::state::{ProfileRecord, RoleGrant};

/// Insert a new profile.
pub async fn insert(pool: &PgPool, record: &ProfileRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO profiles (id, user_id, wallet_address, did, display_name, avatar_url,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id)
    .bind(record.user_id)
    .bind(record.wallet_address.as_ref().map(WalletAddress::as_str))
    .bind(record.did.as_ref().map(Did::as_str))
    .bind(&record.display_name)
    .bind(&record.avatar_url)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a profile's mutable fields.
pub async fn update(pool: &PgPool, record: &ProfileRecord) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE profiles SET wallet_address = $1, did = $2, display_name = $3,
         avatar_url = $4, updated_at = $5 WHERE id = $6",
    )
    .bind(record.wallet_address.as_ref().map(WalletAddress::as_str))
    .bind(record.did.as_ref().map(Did::as_str))
    .bind(&record.display_name)
    .bind(&record.avatar_url)
    .bind(record.updated_at)
    .bind(record.id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all profiles from the database into the in-memory store on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<ProfileRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ProfileRow>(
        "SELECT id, user_id, wallet_address, did, display_name, avatar_url, created_at, updated_at
         FROM profiles ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match row.into_record() {
            Some(record) => records.push(record),
            None => {
                tracing::error!("skipping profile row with invalid wallet_address or did");
            }
        }
    }
    Ok(records)
}

/// Insert a role grant.
pub async fn insert_role(pool: &PgPool, grant: &RoleGrant) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_roles (id, user_id, role, granted_by, granted_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (user_id, role) DO NOTHING",
    )
    .bind(grant.id)
    .bind(grant.user_id)
    .bind(grant.role.as_str())
    .bind(grant.granted_by)
    .bind(grant.granted_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all role grants.
pub async fn load_all_roles(pool: &PgPool) -> Result<Vec<RoleGrant>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RoleRow>(
        "SELECT id, user_id, role, granted_by, granted_at FROM user_roles ORDER BY granted_at",
    )
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match UserRole::parse(&row.role) {
            Ok(role) => records.push(RoleGrant {
                id: row.id,
                user_id: row.user_id,
                role,
                granted_by: row.granted_by,
                granted_at: row.granted_at,
            }),
            Err(_) => {
                tracing::warn!(role = %row.role, "skipping role grant with unknown role");
            }
        }
    }
    Ok(records)
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    user_id: Uuid,
    wallet_address: Option<String>,
    did: Option<String>,
    display_name: Option<String>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProfileRow {
    fn into_record(self) -> Option<ProfileRecord> {
        let wallet_address = match self.wallet_address {
            Some(raw) => match WalletAddress::new(raw) {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!(id = %self.id, error = %e, "invalid wallet_address in profiles row");
                    return None;
                }
            },
            None => None,
        };
        let did = match self.did {
            Some(raw) => match Did::new(raw) {
                Ok(did) => Some(did),
                Err(e) => {
                    tracing::warn!(id = %self.id, error = %e, "invalid did in profiles row");
                    return None;
                }
            },
            None => None,
        };
        Some(ProfileRecord {
            id: self.id,
            user_id: self.user_id,
            wallet_address,
            did,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: Uuid,
    user_id: Uuid,
    role: String,
    granted_by: Option<Uuid>,
    granted_at: DateTime<Utc>,
}
