//! Shopee crawler, backed by the storefront's public JSON search API.
//!
//! ## Observed upstream quirks
//!
//! - Prices arrive in hundred-thousandths of a dollar (`2890000000` is
//!   NT$28,900) and are divided by 100 000 on normalization.
//! - `price_before_discount` is `0` rather than absent when the item is not
//!   on sale; zero is normalized to "no original price".
//! - `item_rating.rating_star` is already on the 0–5 scale and is passed
//!   through unscaled.
//! - Product URLs carry the shop and item ids as `i.<shopid>.<itemid>`;
//!   the detail API wants them as separate query parameters.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use pricelens_core::{ProductResult, SearchFilters, SortKey, StockStatus};

use crate::crawler::{build_http_client, CrawlerConfig, PlatformCrawler};
use crate::error::CrawlerError;
use crate::parse::clean_text;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://shopee.tw";
const IMAGE_BASE_URL: &str = "https://cf.shopee.tw/file";
const PRICE_DIVISOR: f64 = 100_000.0;
const DEFAULT_LIMIT: u32 = 60;

pub struct ShopeeCrawler {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
    retry_base_delay_ms: u64,
}

impl ShopeeCrawler {
    /// Creates a crawler against the live `shopee.tw` storefront.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlerError> {
        Self::with_base_url(config, DEFAULT_BASE_URL.to_owned())
    }

    /// Creates a crawler against an arbitrary base URL. Tests point this at
    /// a local mock server.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(config: &CrawlerConfig, base_url: String) -> Result<Self, CrawlerError> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url,
            max_attempts: config.max_attempts,
            retry_base_delay_ms: config.retry_base_delay_ms,
        })
    }

    fn search_url(&self, keyword: &str, filters: &SearchFilters) -> String {
        // Shopee has no rating sort; newest-first is its nearest server-side
        // ordering. Price is the only ascending order.
        let (by, order) = match filters.sort_by {
            Some(SortKey::Price) => ("price", "asc"),
            Some(SortKey::Sales) => ("sales", "desc"),
            Some(SortKey::Rating) => ("ctime", "desc"),
            Some(SortKey::Relevance) | None => ("relevancy", "desc"),
        };
        let limit = filters.limit.unwrap_or(DEFAULT_LIMIT);
        let offset = filters.page.unwrap_or(0) * limit;
        let encoded = utf8_percent_encode(keyword, NON_ALPHANUMERIC);
        format!(
            "{}/api/v4/search/search_items?by={by}&keyword={encoded}&limit={limit}&newest={offset}&order={order}",
            self.base_url
        )
    }

    async fn fetch_text(&self, url: &str) -> Result<String, CrawlerError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::ACCEPT_LANGUAGE, "zh-TW,zh;q=0.9,en;q=0.8")
            .header(reqwest::header::REFERER, format!("{}/", self.base_url))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlerError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.text().await?)
    }

    async fn fetch_text_with_retry(&self, url: &str) -> Result<String, CrawlerError> {
        retry_with_backoff(self.max_attempts, self.retry_base_delay_ms, || {
            let url = url.to_owned();
            async move { self.fetch_text(&url).await }
        })
        .await
    }

    fn normalize_search_item(&self, item: ShopeeItem) -> ProductResult {
        let mut specs = std::collections::BTreeMap::new();
        specs.insert("shop_id".to_owned(), serde_json::json!(item.shopid));
        specs.insert("item_id".to_owned(), serde_json::json!(item.itemid));
        specs.insert("stock".to_owned(), serde_json::json!(item.stock));
        if let Some(liked) = item.liked_count {
            specs.insert("liked_count".to_owned(), serde_json::json!(liked));
        }
        if let Some(brand) = &item.brand {
            specs.insert("brand".to_owned(), serde_json::json!(brand));
        }
        if let Some(location) = &item.shop_location {
            specs.insert("shop_location".to_owned(), serde_json::json!(location));
        }

        ProductResult {
            name: clean_text(&item.name),
            price: item.price / PRICE_DIVISOR,
            original_price: item
                .price_before_discount
                .filter(|p| *p > 0.0)
                .map(|p| p / PRICE_DIVISOR),
            image_url: item
                .image
                .as_deref()
                .map(|key| format!("{IMAGE_BASE_URL}/{key}")),
            product_url: format!("{}/product/{}/{}", self.base_url, item.shopid, item.itemid),
            platform: self.platform_name().to_owned(),
            rating: item.item_rating.as_ref().and_then(|r| r.rating_star),
            review_count: item
                .item_rating
                .as_ref()
                .and_then(|r| r.rating_count.first().copied()),
            sales_volume: Some(item.historical_sold.or(item.sold).unwrap_or(0)),
            shipping_fee: Some(0.0),
            stock_status: Some(if item.stock > 0 {
                StockStatus::Available
            } else {
                StockStatus::OutOfStock
            }),
            vendor_name: item.shop_location.clone(),
            specs,
        }
    }

    fn normalize_detail(&self, detail: ShopeeItemDetail, url: &str) -> ProductResult {
        let mut specs = std::collections::BTreeMap::new();
        specs.insert("shop_id".to_owned(), serde_json::json!(detail.shopid));
        specs.insert("item_id".to_owned(), serde_json::json!(detail.itemid));
        specs.insert("stock".to_owned(), serde_json::json!(detail.stock));
        if let Some(description) = &detail.description {
            specs.insert("description".to_owned(), serde_json::json!(description));
        }
        if !detail.categories.is_empty() {
            let category = detail
                .categories
                .iter()
                .map(|c| c.display_name.as_str())
                .collect::<Vec<_>>()
                .join(" > ");
            specs.insert("category".to_owned(), serde_json::json!(category));
        }
        if let Some(attributes) = detail.attributes {
            specs.insert("attributes".to_owned(), attributes);
        }

        ProductResult {
            name: clean_text(&detail.name),
            price: detail.price / PRICE_DIVISOR,
            original_price: detail
                .price_before_discount
                .filter(|p| *p > 0.0)
                .map(|p| p / PRICE_DIVISOR),
            image_url: detail
                .image
                .as_deref()
                .map(|key| format!("{IMAGE_BASE_URL}/{key}")),
            product_url: url.to_owned(),
            platform: self.platform_name().to_owned(),
            rating: detail.item_rating.as_ref().and_then(|r| r.rating_star),
            review_count: detail
                .item_rating
                .as_ref()
                .and_then(|r| r.rating_count.first().copied()),
            sales_volume: Some(detail.historical_sold.or(detail.sold).unwrap_or(0)),
            shipping_fee: Some(0.0),
            stock_status: Some(if detail.stock > 0 {
                StockStatus::Available
            } else {
                StockStatus::OutOfStock
            }),
            vendor_name: detail.shop.map(|s| s.name),
            specs,
        }
    }
}

/// Pulls the `i.<shopid>.<itemid>` pair out of a Shopee product URL.
fn extract_item_ids(url: &str) -> Option<(u64, u64)> {
    let re = regex::Regex::new(r"i\.(\d+)\.(\d+)").expect("valid regex");
    let captures = re.captures(url)?;
    let shop_id = captures.get(1)?.as_str().parse().ok()?;
    let item_id = captures.get(2)?.as_str().parse().ok()?;
    Some((shop_id, item_id))
}

#[async_trait]
impl PlatformCrawler for ShopeeCrawler {
    fn platform_id(&self) -> &'static str {
        "shopee"
    }

    fn platform_name(&self) -> &'static str {
        "Shopee"
    }

    fn matches_url(&self, url: &str) -> bool {
        url.contains("shopee.tw")
    }

    async fn search(
        &self,
        keyword: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<ProductResult>, CrawlerError> {
        let url = self.search_url(keyword, filters);
        let body = self.fetch_text_with_retry(&url).await?;
        let parsed: ShopeeSearchResponse =
            serde_json::from_str(&body).map_err(|e| CrawlerError::Deserialize {
                context: format!("Shopee search results for \"{keyword}\""),
                source: e,
            })?;

        Ok(parsed
            .items
            .into_iter()
            .filter_map(|entry| entry.item_basic)
            .map(|item| self.normalize_search_item(item))
            .filter(ProductResult::is_listable)
            .collect())
    }

    async fn product_details(&self, url: &str) -> Result<Option<ProductResult>, CrawlerError> {
        let (shop_id, item_id) =
            extract_item_ids(url).ok_or_else(|| CrawlerError::InvalidProductUrl {
                url: url.to_owned(),
                reason: "expected an i.<shopid>.<itemid> segment".to_owned(),
            })?;

        let api_url = format!(
            "{}/api/v4/item/get?shopid={shop_id}&itemid={item_id}",
            self.base_url
        );
        let body = self.fetch_text_with_retry(&api_url).await?;
        let parsed: ShopeeItemResponse =
            serde_json::from_str(&body).map_err(|e| CrawlerError::Deserialize {
                context: format!("Shopee item {shop_id}/{item_id}"),
                source: e,
            })?;

        Ok(parsed
            .data
            .map(|detail| self.normalize_detail(detail, url))
            .filter(ProductResult::is_listable))
    }
}

// ---------------------------------------------------------------------------
// Upstream response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ShopeeSearchResponse {
    #[serde(default)]
    items: Vec<ShopeeSearchEntry>,
}

#[derive(Debug, Deserialize)]
struct ShopeeSearchEntry {
    /// Absent for ad slots and other non-product entries in the feed.
    #[serde(default)]
    item_basic: Option<ShopeeItem>,
}

#[derive(Debug, Deserialize)]
struct ShopeeItem {
    #[serde(default)]
    name: String,
    /// Price in hundred-thousandths.
    #[serde(default)]
    price: f64,
    /// `0` when the item is not on sale.
    #[serde(default)]
    price_before_discount: Option<f64>,
    /// CDN image key, not a full URL.
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    shopid: u64,
    #[serde(default)]
    itemid: u64,
    #[serde(default)]
    item_rating: Option<ShopeeRating>,
    #[serde(default)]
    historical_sold: Option<u64>,
    #[serde(default)]
    sold: Option<u64>,
    #[serde(default)]
    stock: i64,
    #[serde(default)]
    liked_count: Option<u64>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    shop_location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShopeeRating {
    /// Already on the 0–5 scale.
    #[serde(default)]
    rating_star: Option<f64>,
    /// Index 0 is the total review count; later buckets split by stars.
    #[serde(default)]
    rating_count: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct ShopeeItemResponse {
    #[serde(default)]
    data: Option<ShopeeItemDetail>,
}

#[derive(Debug, Deserialize)]
struct ShopeeItemDetail {
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: f64,
    #[serde(default)]
    price_before_discount: Option<f64>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    shopid: u64,
    #[serde(default)]
    itemid: u64,
    #[serde(default)]
    item_rating: Option<ShopeeRating>,
    #[serde(default)]
    historical_sold: Option<u64>,
    #[serde(default)]
    sold: Option<u64>,
    #[serde(default)]
    stock: i64,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    categories: Vec<ShopeeCategory>,
    #[serde(default)]
    attributes: Option<serde_json::Value>,
    #[serde(default)]
    shop: Option<ShopeeShop>,
}

#[derive(Debug, Deserialize)]
struct ShopeeCategory {
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct ShopeeShop {
    #[serde(default)]
    name: String,
}
