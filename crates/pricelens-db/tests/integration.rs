//! Offline unit tests for pricelens-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::path::PathBuf;

use pricelens_core::{AppConfig, Environment};
use pricelens_db::{ComparisonTaskRow, DbError, PoolConfig, ORDER_STATUSES};

fn test_app_config() -> AppConfig {
    AppConfig {
        env: Environment::Test,
        log_level: "info".to_string(),
        database_url: Some("postgres://example".to_string()),
        user_id: None,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        crawler_request_timeout_secs: 15,
        crawler_user_agent: "ua".to_string(),
        crawler_max_attempts: 3,
        crawler_retry_base_delay_ms: 2000,
        batch_inter_item_delay_ms: 300,
        batch_max_items: 100,
        history_max_entries: 50,
        data_dir: PathBuf::from("./data"),
        openrouter_api_key: None,
        openai_api_key: None,
        vision_model: "google/gemini-flash-1.5".to_string(),
        vision_request_timeout_secs: 30,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&test_app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn pool_config_default_values() {
    let pool_config = PoolConfig::default();
    assert_eq!(pool_config.max_connections, 10);
    assert_eq!(pool_config.min_connections, 1);
    assert_eq!(pool_config.acquire_timeout_secs, 10);
}

/// Compile-time smoke test: confirm that [`ComparisonTaskRow`] has all
/// expected fields with the correct types. No database required.
#[test]
fn comparison_task_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = ComparisonTaskRow {
        id: 1,
        user_id: Uuid::nil(),
        task_name: "Batch Comparison".to_string(),
        search_type: "keyword".to_string(),
        search_input: serde_json::json!([{"identifier": "iphone", "type": "keyword"}]),
        platforms: vec!["shopee".to_string(), "pchome".to_string()],
        status: "pending".to_string(),
        total_products: 2,
        completed_products: 0,
        failed_products: 0,
        error_message: None,
        created_at: Utc::now(),
        started_at: None,
        completed_at: None,
    };

    assert_eq!(row.platforms.len(), 2);
    assert_eq!(row.status, "pending");
}

#[test]
fn invalid_order_status_error_display() {
    let err = DbError::InvalidOrderStatus("lost".to_string());
    assert_eq!(err.to_string(), "invalid order status: lost");
    assert!(!ORDER_STATUSES.contains(&"lost"));
}
