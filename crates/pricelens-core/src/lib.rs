pub mod app_config;
pub mod config;
pub mod product;
pub mod rank;
pub mod stats;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use product::{ProductResult, SearchFilters, SortKey, StockStatus};
pub use rank::{calculate_discount, rank_results, ResultOrdering};
pub use stats::ResultStats;
