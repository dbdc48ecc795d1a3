use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Application configuration, resolved once at startup and passed explicitly
/// into the components that need it. Core logic never reads the process
/// environment directly.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Postgres connection string for the hosted sink. Absent means the
    /// sink is disabled and search runs purely in memory.
    pub database_url: Option<String>,
    /// Partition key for rows written to the hosted sink. A UUID string;
    /// absent means the nil UUID (single-user installation).
    pub user_id: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub crawler_request_timeout_secs: u64,
    pub crawler_user_agent: String,
    /// Total attempts for a crawler network call, first try included.
    pub crawler_max_attempts: u32,
    /// Base delay for the linear retry schedule (`base * attempt`).
    pub crawler_retry_base_delay_ms: u64,
    pub batch_inter_item_delay_ms: u64,
    pub batch_max_items: usize,
    pub history_max_entries: usize,
    /// Directory holding the JSON-file stores (favorites, history, …).
    pub data_dir: PathBuf,
    pub openrouter_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub vision_model: String,
    pub vision_request_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("user_id", &self.user_id)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "crawler_request_timeout_secs",
                &self.crawler_request_timeout_secs,
            )
            .field("crawler_user_agent", &self.crawler_user_agent)
            .field("crawler_max_attempts", &self.crawler_max_attempts)
            .field(
                "crawler_retry_base_delay_ms",
                &self.crawler_retry_base_delay_ms,
            )
            .field("batch_inter_item_delay_ms", &self.batch_inter_item_delay_ms)
            .field("batch_max_items", &self.batch_max_items)
            .field("history_max_entries", &self.history_max_entries)
            .field("data_dir", &self.data_dir)
            .field(
                "openrouter_api_key",
                &self.openrouter_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("vision_model", &self.vision_model)
            .field(
                "vision_request_timeout_secs",
                &self.vision_request_timeout_secs,
            )
            .finish()
    }
}
