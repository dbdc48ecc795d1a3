//! Database operations for `price_alerts`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `price_alerts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceAlertRow {
    pub id: i64,
    pub user_id: Uuid,
    pub product_name: String,
    pub product_url: String,
    pub platform: String,
    pub target_price: Decimal,
    pub triggered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

const ALERT_COLUMNS: &str =
    "id, user_id, product_name, product_url, platform, target_price, triggered_at, created_at";

/// Upserts an alert keyed on `(user_id, product_url)`. Re-adding a watched
/// product updates its target price and re-arms the alert.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_price_alert(
    pool: &PgPool,
    user_id: Uuid,
    product_name: &str,
    product_url: &str,
    platform: &str,
    target_price: f64,
) -> Result<PriceAlertRow, DbError> {
    let row = sqlx::query_as::<_, PriceAlertRow>(&format!(
        "INSERT INTO price_alerts \
             (user_id, product_name, product_url, platform, target_price) \
         VALUES ($1, $2, $3, $4, $5::numeric(12,2)) \
         ON CONFLICT (user_id, product_url) DO UPDATE SET \
             product_name = EXCLUDED.product_name, \
             target_price = EXCLUDED.target_price, \
             triggered_at = NULL \
         RETURNING {ALERT_COLUMNS}"
    ))
    .bind(user_id)
    .bind(product_name)
    .bind(product_url)
    .bind(platform)
    .bind(target_price)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Lists a user's alerts, untriggered first, newest first within each group.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_price_alerts(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<PriceAlertRow>, DbError> {
    let rows = sqlx::query_as::<_, PriceAlertRow>(&format!(
        "SELECT {ALERT_COLUMNS} FROM price_alerts \
         WHERE user_id = $1 \
         ORDER BY (triggered_at IS NOT NULL), created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Stamps `triggered_at` on an alert.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the alert does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn mark_alert_triggered(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let affected = sqlx::query("UPDATE price_alerts SET triggered_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();

    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
