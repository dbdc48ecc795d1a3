//! Database operations for `orders` and `order_items`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// Statuses an order may move through.
pub const ORDER_STATUSES: &[&str] = &[
    "pending",
    "confirmed",
    "shipped",
    "delivered",
    "cancelled",
    "refunded",
];

/// A row from the `orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub user_id: Uuid,
    pub order_number: String,
    pub vendor_id: Option<i64>,
    pub status: String,
    pub total_amount: Decimal,
    pub shipping_fee: Option<Decimal>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `order_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// An order line as submitted by the caller.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: f64,
}

const ORDER_COLUMNS: &str = "id, user_id, order_number, vendor_id, status, total_amount, \
     shipping_fee, notes, created_at, updated_at";

/// Creates an order with its items in one transaction and returns the order
/// row. The total is the sum of line subtotals plus shipping.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement in the transaction fails.
pub async fn create_order(
    pool: &PgPool,
    user_id: Uuid,
    order_number: &str,
    vendor_id: Option<i64>,
    items: &[NewOrderItem],
    shipping_fee: Option<f64>,
    notes: Option<&str>,
) -> Result<OrderRow, DbError> {
    let items_total: f64 = items
        .iter()
        .map(|item| item.unit_price * f64::from(item.quantity))
        .sum();
    let total_amount = items_total + shipping_fee.unwrap_or(0.0);

    let mut tx = pool.begin().await?;

    let order = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders \
             (user_id, order_number, vendor_id, status, total_amount, shipping_fee, notes) \
         VALUES ($1, $2, $3, 'pending', $4::numeric(12,2), $5::numeric(12,2), $6) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(user_id)
    .bind(order_number)
    .bind(vendor_id)
    .bind(total_amount)
    .bind(shipping_fee)
    .bind(notes)
    .fetch_one(&mut *tx)
    .await?;

    for item in items {
        let subtotal = item.unit_price * f64::from(item.quantity);
        sqlx::query(
            "INSERT INTO order_items (order_id, product_name, quantity, unit_price, subtotal) \
             VALUES ($1, $2, $3, $4::numeric(12,2), $5::numeric(12,2))",
        )
        .bind(order.id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(subtotal)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(order)
}

/// Moves an order to a new status.
///
/// # Errors
///
/// Returns [`DbError::InvalidOrderStatus`] for a status outside
/// [`ORDER_STATUSES`], [`DbError::NotFound`] when the order does not exist,
/// or [`DbError::Sqlx`] on query failure.
pub async fn update_order_status(pool: &PgPool, id: i64, status: &str) -> Result<(), DbError> {
    if !ORDER_STATUSES.contains(&status) {
        return Err(DbError::InvalidOrderStatus(status.to_owned()));
    }

    let affected =
        sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(pool)
            .await?
            .rows_affected();

    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Lists a user's orders, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_orders(pool: &PgPool, user_id: Uuid) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Lists the items of one order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_order_items(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItemRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, product_name, quantity, unit_price, subtotal \
         FROM order_items WHERE order_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
