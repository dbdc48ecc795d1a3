//! Crawler lookup table and the multi-platform aggregation entry points.

use std::collections::HashMap;

use pricelens_core::{ProductResult, SearchFilters};

use crate::crawler::{CrawlerConfig, PlatformCrawler};
use crate::error::CrawlerError;

/// Registry of platform crawlers keyed by their lowercase platform id.
///
/// The aggregate operations fan out across registered crawlers and absorb
/// per-platform failures, so a single slow or broken platform never sinks a
/// whole search.
pub struct CrawlerRegistry {
    crawlers: Vec<Box<dyn PlatformCrawler>>,
}

impl CrawlerRegistry {
    /// Creates an empty registry. Tests register fakes into this.
    #[must_use]
    pub fn new() -> Self {
        Self {
            crawlers: Vec::new(),
        }
    }

    /// Creates a registry with all four production crawlers.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Http`] if any crawler's HTTP client cannot be
    /// built.
    pub fn with_default_crawlers(config: &CrawlerConfig) -> Result<Self, CrawlerError> {
        let mut registry = Self::new();
        registry.register(Box::new(crate::adapters::ShopeeCrawler::new(config)?));
        registry.register(Box::new(crate::adapters::PchomeCrawler::new(config)?));
        registry.register(Box::new(crate::adapters::MomoCrawler::new(config)?));
        registry.register(Box::new(crate::adapters::Alibaba1688Crawler::new(config)?));
        Ok(registry)
    }

    pub fn register(&mut self, crawler: Box<dyn PlatformCrawler>) {
        self.crawlers.push(crawler);
    }

    /// Looks a crawler up by platform id, case-insensitively.
    #[must_use]
    pub fn get(&self, platform: &str) -> Option<&dyn PlatformCrawler> {
        let key = platform.to_lowercase();
        self.crawlers
            .iter()
            .find(|c| c.platform_id() == key)
            .map(|c| c.as_ref())
    }

    /// Platform ids available for searching.
    #[must_use]
    pub fn available_platforms(&self) -> Vec<&'static str> {
        self.crawlers.iter().map(|c| c.platform_id()).collect()
    }

    /// Searches the requested platforms concurrently and returns one map
    /// entry per resolved platform.
    ///
    /// A crawler failure is logged and recorded as an empty entry for that
    /// platform — it never fails the aggregate. Requested platforms without
    /// a registered crawler are logged and skipped. Completion order across
    /// platforms is unconstrained; only the final per-key assignment is
    /// guaranteed.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::NoKnownPlatforms`] when none of the requested
    /// platforms resolves to a registered crawler (an empty request list
    /// included).
    pub async fn search_multiple_platforms(
        &self,
        keyword: &str,
        platforms: &[String],
        filters: &SearchFilters,
    ) -> Result<HashMap<String, Vec<ProductResult>>, CrawlerError> {
        let mut resolved: Vec<(String, &dyn PlatformCrawler)> = Vec::new();
        for platform in platforms {
            let key = platform.to_lowercase();
            if resolved.iter().any(|(existing, _)| *existing == key) {
                continue;
            }
            match self.get(&key) {
                Some(crawler) => resolved.push((key, crawler)),
                None => {
                    tracing::warn!(platform = %platform, "no crawler registered for platform — skipping");
                }
            }
        }

        if resolved.is_empty() {
            return Err(CrawlerError::NoKnownPlatforms {
                requested: platforms.to_vec(),
            });
        }

        let searches = resolved.into_iter().map(|(key, crawler)| async move {
            match crawler.search(keyword, filters).await {
                Ok(results) => (key, results),
                Err(err) => {
                    tracing::error!(
                        platform = %key,
                        keyword,
                        error = %err,
                        "platform search failed — recording empty result set"
                    );
                    (key, Vec::new())
                }
            }
        });

        Ok(futures::future::join_all(searches).await.into_iter().collect())
    }

    /// Detects the originating platform of a product URL and fetches its
    /// details through that platform's crawler.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::UnsupportedPlatform`] when no registered
    /// crawler claims the URL's domain, or the crawler's own error.
    pub async fn product_from_url(
        &self,
        url: &str,
    ) -> Result<Option<ProductResult>, CrawlerError> {
        let crawler = self
            .crawlers
            .iter()
            .find(|c| c.matches_url(url))
            .ok_or_else(|| CrawlerError::UnsupportedPlatform {
                url: url.to_owned(),
            })?;
        crawler.product_details(url).await
    }

    /// The canonical "cheapest first" view: aggregate, flatten, stable sort
    /// ascending by price.
    ///
    /// # Errors
    ///
    /// Propagates [`CrawlerError::NoKnownPlatforms`] from the aggregate.
    pub async fn compare_prices(
        &self,
        product_name: &str,
        platforms: &[String],
    ) -> Result<Vec<ProductResult>, CrawlerError> {
        let by_platform = self
            .search_multiple_platforms(product_name, platforms, &SearchFilters::default())
            .await?;

        let mut all: Vec<ProductResult> = by_platform.into_values().flatten().collect();
        all.sort_by(|a, b| a.price.total_cmp(&b.price));
        Ok(all)
    }
}

impl Default for CrawlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
