//! Database operations for `vendors`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `vendors` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VendorRow {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    /// Empty string when the vendor is not tied to a platform; part of the
    /// unique key, so it cannot be `NULL`.
    pub platform: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub rating: Option<Decimal>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upserts a vendor keyed on `(user_id, name, platform)` and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_vendor(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    platform: &str,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO vendors (user_id, name, platform) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, name, platform) DO UPDATE SET \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(user_id)
    .bind(name)
    .bind(platform)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
