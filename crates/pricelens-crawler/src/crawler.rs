//! The platform-crawler capability trait and shared construction config.

use std::time::Duration;

use async_trait::async_trait;

use pricelens_core::{AppConfig, ProductResult, SearchFilters};

use crate::error::CrawlerError;

/// Construction-time configuration shared by every crawler. Built from
/// [`AppConfig`] at the composition root; crawlers never read the process
/// environment themselves.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Total attempts for a network call, first try included.
    pub max_attempts: u32,
    /// Base delay for the linear retry schedule (`base × attempt`).
    pub retry_base_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            user_agent: "pricelens/0.1 (price-comparison)".to_owned(),
            max_attempts: 3,
            retry_base_delay_ms: 2_000,
        }
    }
}

impl CrawlerConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.crawler_request_timeout_secs,
            user_agent: config.crawler_user_agent.clone(),
            max_attempts: config.crawler_max_attempts,
            retry_base_delay_ms: config.crawler_retry_base_delay_ms,
        }
    }
}

/// One e-commerce platform's search and detail-fetch capability.
///
/// Implementations are stateless between calls and registered in a
/// [`CrawlerRegistry`](crate::registry::CrawlerRegistry) keyed by
/// [`platform_id`](PlatformCrawler::platform_id), which keeps them
/// swappable for in-memory fakes in tests.
#[async_trait]
pub trait PlatformCrawler: Send + Sync {
    /// Registry key, lowercase (`"shopee"`).
    fn platform_id(&self) -> &'static str;

    /// Display name stamped into emitted records (`"Shopee"`).
    fn platform_name(&self) -> &'static str;

    /// Returns `true` when this crawler recognizes `url` as one of its
    /// product pages. Used for URL-mode platform detection.
    fn matches_url(&self, url: &str) -> bool;

    /// Searches the platform by keyword.
    ///
    /// "No results" is `Ok(vec![])`, never an error. Every returned record
    /// satisfies [`ProductResult::is_listable`]; records failing it are
    /// dropped before return.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError`] for transport-level failures (network error,
    /// unexpected status, malformed upstream response).
    async fn search(
        &self,
        keyword: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<ProductResult>, CrawlerError>;

    /// Fetches one product's details from its platform URL.
    ///
    /// Returns `Ok(None)` when the page is reachable but no listable
    /// product can be extracted.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::InvalidProductUrl`] when the URL does not
    /// carry the identifiers this platform needs, or a transport-level
    /// [`CrawlerError`] for network failures.
    async fn product_details(&self, url: &str) -> Result<Option<ProductResult>, CrawlerError>;
}

/// Builds the shared-shape `reqwest` client for an adapter: request timeout
/// from config, 10 s connect timeout, configured user agent.
///
/// # Errors
///
/// Returns [`CrawlerError::Http`] if the client cannot be constructed.
pub(crate) fn build_http_client(config: &CrawlerConfig) -> Result<reqwest::Client, CrawlerError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(&config.user_agent)
        .build()?;
    Ok(client)
}
