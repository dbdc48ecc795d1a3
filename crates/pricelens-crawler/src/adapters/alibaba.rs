//! 1688 (Alibaba China) wholesale crawler.
//!
//! 1688 renders search results from a `window.__GLOBAL_DATA__ = {...};`
//! blob embedded in the page; the blob is located by marker and extracted
//! with a balanced-brace scan rather than a lazy regex so nested objects
//! survive. When the page is unreachable (1688 aggressively gates
//! anonymous traffic) the adapter degrades to a synthetic placeholder
//! result instead of failing the whole aggregate, so it carries no retry
//! wrapper.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde_json::Value;

use pricelens_core::{ProductResult, SearchFilters, SortKey, StockStatus};

use crate::crawler::{build_http_client, CrawlerConfig, PlatformCrawler};
use crate::error::CrawlerError;
use crate::parse::{clean_text, parse_price, parse_sales};

const DEFAULT_BASE_URL: &str = "https://s.1688.com";
const FALLBACK_PRODUCT_URL: &str = "https://www.1688.com/";
const MAX_SEARCH_OFFERS: usize = 20;
const MAX_FALLBACK_ROWS: usize = 10;
const UNKNOWN_VENDOR: &str = "未知供應商";

pub struct Alibaba1688Crawler {
    client: reqwest::Client,
    base_url: String,
}

impl Alibaba1688Crawler {
    /// Creates a crawler against the live `s.1688.com` search host.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlerError> {
        Self::with_base_url(config, DEFAULT_BASE_URL.to_owned())
    }

    /// Creates a crawler against an arbitrary base URL (mock servers in tests).
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(config: &CrawlerConfig, base_url: String) -> Result<Self, CrawlerError> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url,
        })
    }

    fn search_url(&self, keyword: &str, filters: &SearchFilters) -> String {
        let encoded = utf8_percent_encode(keyword, NON_ALPHANUMERIC);
        let mut url = format!("{}/selloffer/offer_search.htm?keywords={encoded}", self.base_url);

        match filters.sort_by {
            Some(SortKey::Price) => url.push_str("&sortType=price_asc"),
            Some(SortKey::Sales) => url.push_str("&sortType=monthvolume"),
            _ => {}
        }
        if let Some(min) = filters.price_min {
            url.push_str(&format!("&startPrice={min}"));
        }
        if let Some(max) = filters.price_max {
            url.push_str(&format!("&endPrice={max}"));
        }
        url
    }

    async fn fetch_html(&self, url: &str) -> Result<String, CrawlerError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "zh-CN,zh;q=0.9")
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

    fn parse_search_results(&self, html: &str) -> Vec<ProductResult> {
        if let Some(data) = extract_embedded_json(html, "window.__GLOBAL_DATA__") {
            let offers = data
                .pointer("/data/offerList")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();

            return offers
                .iter()
                .take(MAX_SEARCH_OFFERS)
                .filter_map(|offer| self.normalize_offer(offer))
                .collect();
        }

        parse_html_fallback(html, self.platform_name())
    }

    fn normalize_offer(&self, offer: &Value) -> Option<ProductResult> {
        let product_url = clean_offer_url(
            str_field(offer, &["detailUrl"])
                .or_else(|| str_field(offer, &["url"]))
                .unwrap_or_default(),
        )?;
        let image_url = str_field(offer, &["imgUrl"])
            .or_else(|| str_field(offer, &["image"]))
            .and_then(clean_image_url);

        let name = str_field(offer, &["subject"])
            .or_else(|| str_field(offer, &["title"]))
            .map(clean_text)
            .unwrap_or_default();
        let price = offer
            .pointer("/priceInfo/price")
            .or_else(|| offer.get("price"))
            .map_or(0.0, value_to_price);
        let original_price = offer
            .pointer("/priceInfo/originalPrice")
            .map(value_to_price)
            .filter(|p| *p > 0.0);
        let sales_volume = offer
            .get("monthSoldQuantity")
            .or_else(|| offer.get("soldQuantity"))
            .map(value_to_count);
        let in_stock = offer
            .get("canBookCount")
            .and_then(Value::as_i64)
            .unwrap_or(0)
            > 0;
        let vendor_name = offer
            .pointer("/company/name")
            .and_then(Value::as_str)
            .or_else(|| offer.get("sellerName").and_then(Value::as_str))
            .unwrap_or(UNKNOWN_VENDOR)
            .to_owned();

        let mut specs = std::collections::BTreeMap::new();
        specs.insert(
            "起訂量".to_owned(),
            offer
                .get("minOrderQuantity")
                .or_else(|| offer.get("beginAmount"))
                .cloned()
                .unwrap_or_else(|| Value::String("未知".to_owned())),
        );
        specs.insert(
            "供應商類型".to_owned(),
            offer
                .pointer("/company/supplierType")
                .cloned()
                .unwrap_or_else(|| Value::String("未知".to_owned())),
        );

        let result = ProductResult {
            name,
            price,
            original_price,
            image_url,
            product_url,
            platform: self.platform_name().to_owned(),
            rating: None,
            review_count: None,
            sales_volume,
            shipping_fee: None,
            stock_status: Some(if in_stock {
                StockStatus::Available
            } else {
                StockStatus::OutOfStock
            }),
            vendor_name: Some(vendor_name),
            specs,
        };
        result.is_listable().then_some(result)
    }

    fn parse_product_page(&self, html: &str, url: &str) -> Option<ProductResult> {
        if let Some(data) = extract_embedded_json(html, "window.__INITIAL_DATA__") {
            let offer = data
                .get("offerDetail")
                .or_else(|| data.get("productInfo"))
                .cloned()
                .unwrap_or(Value::Null);

            let name = str_field(&offer, &["subject"])
                .or_else(|| str_field(&offer, &["title"]))
                .map(clean_text)
                .unwrap_or_default();
            let price = offer
                .pointer("/priceInfo/price")
                .or_else(|| offer.get("price"))
                .map_or(0.0, value_to_price);
            let original_price = offer
                .pointer("/priceInfo/originalPrice")
                .map(value_to_price)
                .filter(|p| *p > 0.0);
            let image_url = offer
                .pointer("/image/0")
                .and_then(Value::as_str)
                .or_else(|| offer.get("imgUrl").and_then(Value::as_str))
                .and_then(clean_image_url);
            let sales_volume = offer.get("monthSoldQuantity").map(value_to_count);
            let in_stock = offer
                .get("canBookCount")
                .and_then(Value::as_i64)
                .unwrap_or(0)
                > 0;
            let vendor_name = offer
                .pointer("/sellerInfo/name")
                .and_then(Value::as_str)
                .or_else(|| offer.pointer("/company/name").and_then(Value::as_str))
                .unwrap_or(UNKNOWN_VENDOR)
                .to_owned();
            let specs = offer
                .get("attributes")
                .and_then(Value::as_object)
                .map(|map| map.clone().into_iter().collect())
                .unwrap_or_default();

            let result = ProductResult {
                name,
                price,
                original_price,
                image_url,
                product_url: url.to_owned(),
                platform: self.platform_name().to_owned(),
                rating: None,
                review_count: None,
                sales_volume,
                shipping_fee: None,
                stock_status: Some(if in_stock {
                    StockStatus::Available
                } else {
                    StockStatus::OutOfStock
                }),
                vendor_name: Some(vendor_name),
                specs,
            };
            return result.is_listable().then_some(result);
        }

        // Bare-bones fallback from the page markup.
        let title_re = regex::Regex::new(r"<h1[^>]*>(.*?)</h1>").expect("valid regex");
        let price_re = regex::Regex::new(r"¥\s*([\d,.]+)").expect("valid regex");
        let name = title_re
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| clean_text(m.as_str()))
            .unwrap_or_default();
        let price = price_re
            .captures(html)
            .and_then(|c| c.get(1))
            .map_or(0.0, |m| parse_price(m.as_str()));

        let result = ProductResult {
            name,
            price,
            original_price: None,
            image_url: None,
            product_url: url.to_owned(),
            platform: self.platform_name().to_owned(),
            rating: None,
            review_count: None,
            sales_volume: None,
            shipping_fee: None,
            stock_status: Some(StockStatus::Available),
            vendor_name: None,
            specs: std::collections::BTreeMap::new(),
        };
        result.is_listable().then_some(result)
    }

    /// Synthetic placeholder returned when 1688 cannot be reached at all.
    fn fallback_results(&self, keyword: &str) -> Vec<ProductResult> {
        let mut specs = std::collections::BTreeMap::new();
        specs.insert(
            "說明".to_owned(),
            Value::String("1688需要登入才能查看完整商品信息".to_owned()),
        );
        specs.insert(
            "提示".to_owned(),
            Value::String("請直接訪問1688網站搜尋".to_owned()),
        );

        vec![ProductResult {
            name: format!("{keyword} - 1688批發商品"),
            price: 88.0,
            original_price: None,
            image_url: None,
            product_url: FALLBACK_PRODUCT_URL.to_owned(),
            platform: self.platform_name().to_owned(),
            rating: None,
            review_count: None,
            sales_volume: None,
            shipping_fee: None,
            stock_status: Some(StockStatus::Available),
            vendor_name: Some("1688供應商".to_owned()),
            specs,
        }]
    }
}

#[async_trait]
impl PlatformCrawler for Alibaba1688Crawler {
    fn platform_id(&self) -> &'static str {
        "1688"
    }

    fn platform_name(&self) -> &'static str {
        "1688"
    }

    fn matches_url(&self, url: &str) -> bool {
        url.contains("1688.com")
    }

    async fn search(
        &self,
        keyword: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<ProductResult>, CrawlerError> {
        let url = self.search_url(keyword, filters);
        match self.fetch_html(&url).await {
            Ok(html) => Ok(self.parse_search_results(&html)),
            Err(err) => {
                tracing::warn!(
                    keyword,
                    error = %err,
                    "1688 search unreachable — returning placeholder result"
                );
                Ok(self.fallback_results(keyword))
            }
        }
    }

    async fn product_details(&self, url: &str) -> Result<Option<ProductResult>, CrawlerError> {
        match self.fetch_html(url).await {
            Ok(html) => Ok(self.parse_product_page(&html, url)),
            Err(err) => {
                tracing::warn!(url, error = %err, "1688 detail page unreachable");
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Embedded-JSON extraction
// ---------------------------------------------------------------------------

/// Finds `marker` in the page and parses the balanced `{…}` object assigned
/// to it. Returns `None` when the marker is absent or the blob is not valid
/// JSON.
fn extract_embedded_json(html: &str, marker: &str) -> Option<Value> {
    let marker_at = html.find(marker)?;
    let after_marker = &html[marker_at + marker.len()..];
    let brace_at = after_marker.find('{')?;
    let blob = extract_balanced_object(&after_marker[brace_at..])?;
    serde_json::from_str(blob).ok()
}

/// Returns the prefix of `s` forming one balanced JSON object, skipping
/// braces inside string literals. `s` must start with `{`.
fn extract_balanced_object(s: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&s[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_html_fallback(html: &str, platform: &str) -> Vec<ProductResult> {
    let title_re = regex::Regex::new(r#"title="([^"]*)""#).expect("valid regex");
    let price_re = regex::Regex::new(r"¥\s*([\d,.]+)").expect("valid regex");

    let titles: Vec<&str> = title_re
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let prices: Vec<&str> = price_re
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    titles
        .iter()
        .zip(prices.iter())
        .take(MAX_FALLBACK_ROWS)
        .filter_map(|(title, price)| {
            let result = ProductResult {
                name: clean_text(title),
                price: parse_price(price),
                original_price: None,
                image_url: None,
                product_url: FALLBACK_PRODUCT_URL.to_owned(),
                platform: platform.to_owned(),
                rating: None,
                review_count: None,
                sales_volume: None,
                shipping_fee: None,
                stock_status: Some(StockStatus::Available),
                vendor_name: None,
                specs: std::collections::BTreeMap::new(),
            };
            result.is_listable().then_some(result)
        })
        .collect()
}

fn str_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

fn value_to_price(value: &Value) -> f64 {
    match value {
        Value::String(s) => parse_price(s),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn value_to_count(value: &Value) -> u64 {
    match value {
        Value::String(s) => parse_sales(s),
        Value::Number(n) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

/// Completes an offer URL: protocol-relative gains `https:`, bare hosts gain
/// `https://`. Empty input yields `None`.
fn clean_offer_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    if let Some(rest) = url.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    if !url.starts_with("http") {
        return Some(format!("https://{url}"));
    }
    Some(url.to_owned())
}

/// 1688 image URLs append size suffixes after `_`; strip them and complete
/// the scheme.
fn clean_image_url(url: &str) -> Option<String> {
    let trimmed = url.split('_').next().unwrap_or_default();
    clean_offer_url(trimmed)
}
