//! The three search modes and the best-effort sink write path.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use pricelens_core::{ProductResult, SearchFilters};
use pricelens_crawler::CrawlerRegistry;
use pricelens_vision::{ImageRecognizer, VisionError};

use crate::error::CompareError;

#[derive(Debug, Clone)]
pub struct KeywordSearch {
    pub keyword: String,
    pub platforms: Vec<String>,
    pub filters: SearchFilters,
}

#[derive(Debug, Clone)]
pub struct UrlSearch {
    pub url: String,
    pub platforms: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ImageSearch {
    pub image_url: String,
    pub platforms: Vec<String>,
}

/// Image mode returns the recognized keywords alongside the results so the
/// caller can show what was searched for.
#[derive(Debug, Clone)]
pub struct ImageSearchOutcome {
    pub keywords: Vec<String>,
    pub results: Vec<ProductResult>,
}

/// Composition of crawler registry, recognizer, and optional Postgres sink.
///
/// The sink never gates search: a missing pool disables persistence, and a
/// failing write is logged and skipped per record.
pub struct ComparisonService {
    registry: CrawlerRegistry,
    recognizer: ImageRecognizer,
    sink: Option<(PgPool, Uuid)>,
}

impl ComparisonService {
    #[must_use]
    pub fn new(registry: CrawlerRegistry, recognizer: ImageRecognizer) -> Self {
        Self {
            registry,
            recognizer,
            sink: None,
        }
    }

    /// Attaches the hosted backend, partitioned by `user_id`.
    #[must_use]
    pub fn with_sink(mut self, pool: PgPool, user_id: Uuid) -> Self {
        self.sink = Some((pool, user_id));
        self
    }

    #[must_use]
    pub fn registry(&self) -> &CrawlerRegistry {
        &self.registry
    }

    #[must_use]
    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// The attached pool and partition key, for callers that record their
    /// own rows (e.g. the batch task lifecycle).
    #[must_use]
    pub fn sink(&self) -> Option<(&PgPool, Uuid)> {
        self.sink.as_ref().map(|(pool, user_id)| (pool, *user_id))
    }

    /// Keyword mode: fan out, flatten in the requested platform order.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Crawler`] when no requested platform has a
    /// registered crawler.
    pub async fn search_by_keyword(
        &self,
        input: &KeywordSearch,
    ) -> Result<Vec<ProductResult>, CompareError> {
        let by_platform = self
            .registry
            .search_multiple_platforms(&input.keyword, &input.platforms, &input.filters)
            .await?;
        Ok(flatten_in_platform_order(by_platform, &input.platforms))
    }

    /// URL mode: resolve the source product, then search the *other*
    /// platforms by its name. The source product is always first in the
    /// returned list.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Crawler`] when no crawler claims the URL and
    /// [`CompareError::NoProductInfo`] when the claiming crawler cannot
    /// extract a product from the page.
    pub async fn search_by_url(
        &self,
        input: &UrlSearch,
    ) -> Result<Vec<ProductResult>, CompareError> {
        let origin =
            self.registry
                .product_from_url(&input.url)
                .await?
                .ok_or_else(|| CompareError::NoProductInfo {
                    url: input.url.clone(),
                })?;

        let other_platforms: Vec<String> = input
            .platforms
            .iter()
            .filter(|p| !p.eq_ignore_ascii_case(&origin.platform))
            .cloned()
            .collect();

        let mut all = vec![origin.clone()];
        if !other_platforms.is_empty() {
            let by_platform = self
                .registry
                .search_multiple_platforms(&origin.name, &other_platforms, &SearchFilters::default())
                .await?;
            all.extend(flatten_in_platform_order(by_platform, &other_platforms));
        }
        Ok(all)
    }

    /// Image mode: recognize, then search with the top keyword. Recognition
    /// failure (including an empty keyword list) abandons the search — there
    /// is no fallback keyword.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Vision`] when recognition fails and
    /// [`CompareError::Crawler`] when no requested platform resolves.
    pub async fn search_by_image(
        &self,
        input: &ImageSearch,
    ) -> Result<ImageSearchOutcome, CompareError> {
        let recognition = self.recognizer.recognize(&input.image_url).await?;
        let keyword = recognition
            .top_keyword()
            .ok_or(VisionError::NoKeywords)?
            .to_owned();

        let by_platform = self
            .registry
            .search_multiple_platforms(&keyword, &input.platforms, &SearchFilters::default())
            .await?;
        Ok(ImageSearchOutcome {
            keywords: recognition.keywords,
            results: flatten_in_platform_order(by_platform, &input.platforms),
        })
    }

    /// Writes results into the hosted backend, one product + vendor +
    /// price-record chain per result. Per-record failures are logged and
    /// skipped. Returns how many records were persisted; always `0` without
    /// a configured sink.
    pub async fn persist_results(&self, results: &[ProductResult]) -> usize {
        let Some((pool, user_id)) = &self.sink else {
            return 0;
        };

        let mut saved = 0usize;
        for result in results {
            match persist_one(pool, *user_id, result).await {
                Ok(()) => saved += 1,
                Err(err) => {
                    tracing::warn!(
                        product = %result.name,
                        platform = %result.platform,
                        error = %err,
                        "failed to persist comparison result — skipping"
                    );
                }
            }
        }
        saved
    }
}

async fn persist_one(
    pool: &PgPool,
    user_id: Uuid,
    result: &ProductResult,
) -> Result<(), pricelens_db::DbError> {
    let product_id = pricelens_db::upsert_product(pool, user_id, result).await?;
    let vendor_id = match &result.vendor_name {
        Some(name) => {
            Some(pricelens_db::upsert_vendor(pool, user_id, name, &result.platform).await?)
        }
        None => None,
    };
    pricelens_db::insert_price_record(pool, product_id, vendor_id, result).await?;
    Ok(())
}

/// Flattens the per-platform map following the caller's platform order, so
/// output order is deterministic regardless of which platform finished
/// first.
fn flatten_in_platform_order(
    mut by_platform: HashMap<String, Vec<ProductResult>>,
    platforms: &[String],
) -> Vec<ProductResult> {
    let mut all = Vec::new();
    for platform in platforms {
        if let Some(results) = by_platform.remove(&platform.to_lowercase()) {
            all.extend(results);
        }
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(platform: &str, name: &str) -> ProductResult {
        ProductResult {
            name: name.to_owned(),
            price: 100.0,
            original_price: None,
            image_url: None,
            product_url: format!("https://{platform}/p/{name}"),
            platform: platform.to_owned(),
            rating: None,
            review_count: None,
            sales_volume: None,
            shipping_fee: None,
            stock_status: None,
            vendor_name: None,
            specs: std::collections::BTreeMap::new(),
        }
    }

    #[test]
    fn flatten_follows_requested_order() {
        let mut map = HashMap::new();
        map.insert("pchome".to_owned(), vec![make_result("PChome", "b")]);
        map.insert("shopee".to_owned(), vec![make_result("Shopee", "a")]);

        let platforms = vec!["shopee".to_owned(), "pchome".to_owned()];
        let flat = flatten_in_platform_order(map, &platforms);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].platform, "Shopee");
        assert_eq!(flat[1].platform, "PChome");
    }

    #[test]
    fn flatten_ignores_platforms_missing_from_map() {
        let map = HashMap::new();
        let platforms = vec!["shopee".to_owned()];
        assert!(flatten_in_platform_order(map, &platforms).is_empty());
    }
}
