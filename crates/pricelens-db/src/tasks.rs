//! Database operations for `comparison_tasks` — the persisted batch-run
//! lifecycle: `pending → running → completed | failed`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `comparison_tasks` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ComparisonTaskRow {
    pub id: i64,
    pub user_id: Uuid,
    pub task_name: String,
    pub search_type: String,
    /// The submitted batch items, serialized as given.
    pub search_input: serde_json::Value,
    pub platforms: Vec<String>,
    pub status: String,
    pub total_products: i32,
    pub completed_products: i32,
    pub failed_products: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

const TASK_COLUMNS: &str = "id, user_id, task_name, search_type, search_input, platforms, \
     status, total_products, completed_products, failed_products, error_message, \
     created_at, started_at, completed_at";

/// Creates a task in `pending` status and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_comparison_task(
    pool: &PgPool,
    user_id: Uuid,
    task_name: &str,
    search_type: &str,
    search_input: &serde_json::Value,
    platforms: &[String],
    total_products: i32,
) -> Result<ComparisonTaskRow, DbError> {
    let row = sqlx::query_as::<_, ComparisonTaskRow>(&format!(
        "INSERT INTO comparison_tasks \
             (user_id, task_name, search_type, search_input, platforms, status, total_products) \
         VALUES ($1, $2, $3, $4::jsonb, $5, 'pending', $6) \
         RETURNING {TASK_COLUMNS}"
    ))
    .bind(user_id)
    .bind(task_name)
    .bind(search_type)
    .bind(search_input)
    .bind(platforms)
    .bind(total_products)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a task as `running` and stamps `started_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the task does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn start_comparison_task(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let affected = sqlx::query(
        "UPDATE comparison_tasks SET status = 'running', started_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Updates the running completed/failed counters after an item settles.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the task does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn update_task_progress(
    pool: &PgPool,
    id: i64,
    completed_products: i32,
    failed_products: i32,
) -> Result<(), DbError> {
    let affected = sqlx::query(
        "UPDATE comparison_tasks SET completed_products = $2, failed_products = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(completed_products)
    .bind(failed_products)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Marks a task as `completed` and stamps `completed_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the task does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn complete_comparison_task(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let affected = sqlx::query(
        "UPDATE comparison_tasks SET status = 'completed', completed_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Marks a task as `failed` with its error message and stamps `completed_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when the task does not exist, or
/// [`DbError::Sqlx`] on query failure.
pub async fn fail_comparison_task(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let affected = sqlx::query(
        "UPDATE comparison_tasks \
         SET status = 'failed', error_message = $2, completed_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(error_message)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Fetches a task by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn get_comparison_task(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ComparisonTaskRow>, DbError> {
    let row = sqlx::query_as::<_, ComparisonTaskRow>(&format!(
        "SELECT {TASK_COLUMNS} FROM comparison_tasks WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
