//! Aggregator behavior over in-memory fake crawlers: per-platform failure
//! isolation, unknown-platform handling, URL dispatch, and the cheapest-first
//! comparison view.

use std::collections::BTreeMap;

use async_trait::async_trait;

use pricelens_core::{ProductResult, SearchFilters, StockStatus};
use pricelens_crawler::{CrawlerError, CrawlerRegistry, PlatformCrawler};

struct FakeCrawler {
    id: &'static str,
    name: &'static str,
    domain: &'static str,
    prices: Vec<f64>,
    fail: bool,
}

impl FakeCrawler {
    fn ok(id: &'static str, name: &'static str, domain: &'static str, prices: Vec<f64>) -> Self {
        Self {
            id,
            name,
            domain,
            prices,
            fail: false,
        }
    }

    fn failing(id: &'static str, name: &'static str, domain: &'static str) -> Self {
        Self {
            id,
            name,
            domain,
            prices: Vec::new(),
            fail: true,
        }
    }

    fn make_result(&self, price: f64) -> ProductResult {
        ProductResult {
            name: format!("{} item at {price}", self.name),
            price,
            original_price: None,
            image_url: None,
            product_url: format!("https://{}/product/{price}", self.domain),
            platform: self.name.to_owned(),
            rating: None,
            review_count: None,
            sales_volume: None,
            shipping_fee: None,
            stock_status: Some(StockStatus::Available),
            vendor_name: None,
            specs: BTreeMap::new(),
        }
    }
}

#[async_trait]
impl PlatformCrawler for FakeCrawler {
    fn platform_id(&self) -> &'static str {
        self.id
    }

    fn platform_name(&self) -> &'static str {
        self.name
    }

    fn matches_url(&self, url: &str) -> bool {
        url.contains(self.domain)
    }

    async fn search(
        &self,
        _keyword: &str,
        _filters: &SearchFilters,
    ) -> Result<Vec<ProductResult>, CrawlerError> {
        if self.fail {
            return Err(CrawlerError::UnexpectedStatus {
                status: 503,
                url: format!("https://{}/search", self.domain),
            });
        }
        Ok(self.prices.iter().map(|p| self.make_result(*p)).collect())
    }

    async fn product_details(&self, url: &str) -> Result<Option<ProductResult>, CrawlerError> {
        if self.fail {
            return Err(CrawlerError::UnexpectedStatus {
                status: 503,
                url: url.to_owned(),
            });
        }
        Ok(self.prices.first().map(|p| {
            let mut result = self.make_result(*p);
            result.product_url = url.to_owned();
            result
        }))
    }
}

fn registry_with(crawlers: Vec<FakeCrawler>) -> CrawlerRegistry {
    let mut registry = CrawlerRegistry::new();
    for crawler in crawlers {
        registry.register(Box::new(crawler));
    }
    registry
}

fn platform_list(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_owned()).collect()
}

#[tokio::test]
async fn one_map_entry_per_requested_platform_including_failures() {
    let registry = registry_with(vec![
        FakeCrawler::ok("shopee", "Shopee", "shopee.tw", vec![100.0, 200.0]),
        FakeCrawler::failing("pchome", "PChome", "pchome.com.tw"),
    ]);

    let map = registry
        .search_multiple_platforms(
            "iphone",
            &platform_list(&["shopee", "pchome"]),
            &SearchFilters::default(),
        )
        .await
        .expect("aggregate must not fail on a single platform error");

    assert_eq!(map.len(), 2);
    assert_eq!(map.get("shopee").map(Vec::len), Some(2));
    assert_eq!(
        map.get("pchome").map(Vec::len),
        Some(0),
        "failed platform maps to an empty list"
    );
}

#[tokio::test]
async fn unknown_platforms_are_skipped_without_failing() {
    let registry = registry_with(vec![FakeCrawler::ok(
        "shopee",
        "Shopee",
        "shopee.tw",
        vec![100.0],
    )]);

    let map = registry
        .search_multiple_platforms(
            "iphone",
            &platform_list(&["shopee", "yahoo"]),
            &SearchFilters::default(),
        )
        .await
        .expect("one known platform is enough");

    assert_eq!(map.len(), 1, "unknown platform must not appear in the map");
    assert!(map.contains_key("shopee"));
}

#[tokio::test]
async fn all_unknown_platforms_is_an_error() {
    let registry = registry_with(vec![FakeCrawler::ok(
        "shopee",
        "Shopee",
        "shopee.tw",
        vec![100.0],
    )]);

    let result = registry
        .search_multiple_platforms(
            "iphone",
            &platform_list(&["yahoo", "rakuten"]),
            &SearchFilters::default(),
        )
        .await;

    assert!(matches!(
        result,
        Err(CrawlerError::NoKnownPlatforms { requested }) if requested.len() == 2
    ));
}

#[tokio::test]
async fn empty_platform_list_is_an_error() {
    let registry = registry_with(vec![FakeCrawler::ok(
        "shopee",
        "Shopee",
        "shopee.tw",
        vec![100.0],
    )]);

    let result = registry
        .search_multiple_platforms("iphone", &[], &SearchFilters::default())
        .await;
    assert!(matches!(result, Err(CrawlerError::NoKnownPlatforms { .. })));
}

#[tokio::test]
async fn platform_keys_are_matched_case_insensitively() {
    let registry = registry_with(vec![FakeCrawler::ok(
        "shopee",
        "Shopee",
        "shopee.tw",
        vec![100.0],
    )]);

    let map = registry
        .search_multiple_platforms(
            "iphone",
            &platform_list(&["Shopee"]),
            &SearchFilters::default(),
        )
        .await
        .unwrap();
    assert!(map.contains_key("shopee"), "keys normalize to lowercase");
}

#[tokio::test]
async fn duplicate_platform_keys_collapse_to_one_entry() {
    let registry = registry_with(vec![FakeCrawler::ok(
        "shopee",
        "Shopee",
        "shopee.tw",
        vec![100.0],
    )]);

    let map = registry
        .search_multiple_platforms(
            "iphone",
            &platform_list(&["shopee", "SHOPEE"]),
            &SearchFilters::default(),
        )
        .await
        .unwrap();
    assert_eq!(map.len(), 1);
}

#[tokio::test]
async fn compare_prices_merges_and_sorts_ascending_without_platform_bias() {
    let registry = registry_with(vec![
        FakeCrawler::ok(
            "shopee",
            "Shopee",
            "shopee.tw",
            vec![600.0, 100.0, 300.0, 500.0, 200.0],
        ),
        FakeCrawler::ok(
            "pchome",
            "PChome",
            "pchome.com.tw",
            vec![150.0, 250.0, 350.0, 450.0, 550.0],
        ),
    ]);

    let merged = registry
        .compare_prices("iphone", &platform_list(&["shopee", "pchome"]))
        .await
        .unwrap();

    assert_eq!(merged.len(), 10);
    let prices: Vec<f64> = merged.iter().map(|r| r.price).collect();
    let mut sorted = prices.clone();
    sorted.sort_by(f64::total_cmp);
    assert_eq!(prices, sorted, "must be ascending by price");
    assert!(merged.iter().any(|r| r.platform == "Shopee"));
    assert!(merged.iter().any(|r| r.platform == "PChome"));
}

#[tokio::test]
async fn product_from_url_dispatches_by_domain() {
    let registry = registry_with(vec![
        FakeCrawler::ok("shopee", "Shopee", "shopee.tw", vec![99.0]),
        FakeCrawler::ok("momo", "Momo", "momoshop.com.tw", vec![88.0]),
    ]);

    let result = registry
        .product_from_url("https://www.momoshop.com.tw/goods/Detail?i=1")
        .await
        .unwrap()
        .expect("momo fake returns a product");
    assert_eq!(result.platform, "Momo");
}

#[tokio::test]
async fn product_from_unclaimed_url_is_unsupported_platform() {
    let registry = registry_with(vec![FakeCrawler::ok(
        "shopee",
        "Shopee",
        "shopee.tw",
        vec![99.0],
    )]);

    let result = registry
        .product_from_url("https://www.amazon.com/dp/B000")
        .await;
    assert!(matches!(
        result,
        Err(CrawlerError::UnsupportedPlatform { .. })
    ));
}
