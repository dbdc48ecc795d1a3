//! Database operations for `products` and `price_records`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use pricelens_core::ProductResult;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    /// The product page URL; the natural key within a user's partition.
    pub original_url: String,
    pub specs: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `price_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceRecordRow {
    pub id: i64,
    pub product_id: i64,
    pub vendor_id: Option<i64>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    /// Percentage, two decimal places, computed at insert time.
    pub discount_rate: Option<Decimal>,
    pub stock_status: Option<String>,
    pub sales_volume: Option<i64>,
    pub rating: Option<Decimal>,
    pub review_count: Option<i64>,
    pub product_url: Option<String>,
    pub shipping_fee: Option<Decimal>,
    pub platform: String,
    pub platform_specific_data: serde_json::Value,
    pub is_available: bool,
    pub scraped_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Upserts a product keyed on `(user_id, original_url)` and returns its id.
///
/// `f64` money/rating values are cast to fixed-scale `NUMERIC` columns by
/// the database; this is the documented precision boundary between
/// scrape-time floats and stored prices.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product(
    pool: &PgPool,
    user_id: Uuid,
    result: &ProductResult,
) -> Result<i64, DbError> {
    let specs = json!(result.specs);

    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products (user_id, name, image_url, original_url, specs) \
         VALUES ($1, $2, $3, $4, $5::jsonb) \
         ON CONFLICT (user_id, original_url) DO UPDATE SET \
             name       = EXCLUDED.name, \
             image_url  = EXCLUDED.image_url, \
             specs      = EXCLUDED.specs, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(user_id)
    .bind(&result.name)
    .bind(&result.image_url)
    .bind(&result.product_url)
    .bind(specs)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Inserts one price observation for a product and returns the record id.
///
/// The discount rate is computed here from `original_price` when present
/// (the same `(original − current) / original × 100` the display layer
/// rounds for badges), so stored records carry it even if the caller never
/// ran the ranker.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
#[allow(clippy::cast_possible_wrap)]
pub async fn insert_price_record(
    pool: &PgPool,
    product_id: i64,
    vendor_id: Option<i64>,
    result: &ProductResult,
) -> Result<i64, DbError> {
    let discount_rate = result
        .original_price
        .filter(|original| *original > 0.0)
        .map(|original| (original - result.price) / original * 100.0);
    let stock_status = result.stock_status.map(pricelens_core::StockStatus::as_str);
    let is_available = !matches!(
        result.stock_status,
        Some(pricelens_core::StockStatus::OutOfStock)
    );
    let platform_data = json!(result.specs);

    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO price_records \
             (product_id, vendor_id, price, original_price, discount_rate, stock_status, \
              sales_volume, rating, review_count, product_url, shipping_fee, platform, \
              platform_specific_data, is_available) \
         VALUES ($1, $2, $3::numeric(12,2), $4::numeric(12,2), $5::numeric(5,2), $6, \
                 $7, $8::numeric(3,2), $9, $10, $11::numeric(12,2), $12, \
                 $13::jsonb, $14) \
         RETURNING id",
    )
    .bind(product_id)
    .bind(vendor_id)
    .bind(result.price)
    .bind(result.original_price)
    .bind(discount_rate)
    .bind(stock_status)
    .bind(result.sales_volume.map(|v| v as i64))
    .bind(result.rating)
    .bind(result.review_count.map(|v| v as i64))
    .bind(&result.product_url)
    .bind(result.shipping_fee)
    .bind(&result.platform)
    .bind(platform_data)
    .bind(is_available)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
