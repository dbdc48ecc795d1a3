//! Optional hosted Postgres sink for completed comparison results.
//!
//! The search core never requires this crate at runtime: a missing
//! `DATABASE_URL` simply disables persistence. Everything here is
//! best-effort from the caller's point of view — see
//! `pricelens-compare` for the warn-and-continue write path.

pub mod alerts;
pub mod orders;
pub mod products;
pub mod tasks;
pub mod vendors;

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

pub use alerts::{list_price_alerts, mark_alert_triggered, upsert_price_alert, PriceAlertRow};
pub use orders::{
    create_order, list_order_items, list_orders, update_order_status, NewOrderItem, OrderItemRow,
    OrderRow, ORDER_STATUSES,
};
pub use products::{insert_price_record, upsert_product, PriceRecordRow, ProductRow};
pub use tasks::{
    complete_comparison_task, create_comparison_task, fail_comparison_task, get_comparison_task,
    start_comparison_task, update_task_progress, ComparisonTaskRow,
};
pub use vendors::{upsert_vendor, VendorRow};

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/pricelens-db/Cargo.toml; resolves to
// <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &pricelens_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("invalid order status: {0}")]
    InvalidOrderStatus(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Applies all pending workspace migrations.
///
/// # Errors
///
/// Returns [`DbError::Migration`] when a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}
