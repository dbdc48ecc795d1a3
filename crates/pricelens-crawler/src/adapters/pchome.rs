//! PChome 24h crawler, parsing storefront search-result card markup.
//!
//! PChome serves both a legacy (`.prod_item`) and a current (`.c-prodInfo`)
//! card layout depending on the page variant; selectors cover both. The
//! original-price element is only rendered for discounted items.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use scraper::{Html, Selector};

use pricelens_core::{ProductResult, SearchFilters, SortKey, StockStatus};

use crate::crawler::{build_http_client, CrawlerConfig, PlatformCrawler};
use crate::error::CrawlerError;
use crate::parse::{clean_text, complete_url, parse_price};
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://24h.pchome.com.tw";

pub struct PchomeCrawler {
    client: reqwest::Client,
    base_url: String,
    max_attempts: u32,
    retry_base_delay_ms: u64,
}

impl PchomeCrawler {
    /// Creates a crawler against the live `24h.pchome.com.tw` storefront.
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
            max_attempts: config.max_attempts,
            retry_base_delay_ms: config.retry_base_delay_ms,
        })
    }

    fn search_url(&self, keyword: &str, filters: &SearchFilters) -> String {
        let sort = match filters.sort_by {
            Some(SortKey::Price) => "price/asc",
            Some(SortKey::Sales) => "sale/dc",
            _ => "rnk/dc",
        };
        let encoded = utf8_percent_encode(keyword, NON_ALPHANUMERIC);
        format!("{}/search/v3.3/?q={encoded}&sort={sort}", self.base_url)
    }

    async fn fetch_html(&self, url: &str) -> Result<String, CrawlerError> {
        let response = self
            .client
            .get(url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "zh-TW,zh;q=0.9")
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

    async fn fetch_html_with_retry(&self, url: &str) -> Result<String, CrawlerError> {
        retry_with_backoff(self.max_attempts, self.retry_base_delay_ms, || {
            let url = url.to_owned();
            async move { self.fetch_html(&url).await }
        })
        .await
    }

    fn parse_search_results(&self, html: &str) -> Vec<ProductResult> {
        let document = Html::parse_document(html);
        let card = Selector::parse("#ProductContainer .prod_item, .c-prodInfo")
            .expect("valid selector");
        let name_sel =
            Selector::parse(".prod_name, .c-prodInfo__title").expect("valid selector");
        let price_sel =
            Selector::parse(".price, .c-prodInfo__price").expect("valid selector");
        let original_sel = Selector::parse(".price_org, .c-prodInfo__price--original")
            .expect("valid selector");
        let link_sel = Selector::parse("a").expect("valid selector");
        let image_sel = Selector::parse("img").expect("valid selector");

        let mut results = Vec::new();
        for element in document.select(&card) {
            let name = element
                .select(&name_sel)
                .next()
                .map(|e| clean_text(&e.text().collect::<String>()))
                .unwrap_or_default();
            let price = element
                .select(&price_sel)
                .next()
                .map(|e| parse_price(&e.text().collect::<String>()))
                .unwrap_or(0.0);
            let original_price = element
                .select(&original_sel)
                .next()
                .map(|e| parse_price(&e.text().collect::<String>()))
                .filter(|p| *p > 0.0);
            let product_url = element
                .select(&link_sel)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| complete_url(&self.base_url, href));
            let image_url = element
                .select(&image_sel)
                .next()
                .and_then(|img| img.value().attr("src").or_else(|| img.value().attr("data-src")))
                .map(|src| complete_url(&self.base_url, src));

            let Some(product_url) = product_url else {
                continue;
            };

            let result = ProductResult {
                name,
                price,
                original_price,
                image_url,
                product_url,
                platform: self.platform_name().to_owned(),
                rating: None,
                review_count: None,
                sales_volume: None,
                shipping_fee: Some(0.0),
                stock_status: Some(StockStatus::Available),
                vendor_name: None,
                specs: std::collections::BTreeMap::new(),
            };
            if result.is_listable() {
                results.push(result);
            }
        }
        results
    }

    fn parse_product_details(&self, html: &str, url: &str) -> Option<ProductResult> {
        let document = Html::parse_document(html);
        let name_sel = Selector::parse("#ProdInfo h1, .prod-name").expect("valid selector");
        let price_sel = Selector::parse("#ProdInfo .price, .prod-price").expect("valid selector");
        let original_sel =
            Selector::parse(".price_org, .prod-price-original").expect("valid selector");
        let image_sel = Selector::parse("#ProdInfo img, .prod-img img").expect("valid selector");
        let spec_row_sel =
            Selector::parse(".prod-spec-table tr, .spec-item").expect("valid selector");
        let spec_key_sel = Selector::parse("th, .spec-name").expect("valid selector");
        let spec_value_sel = Selector::parse("td, .spec-value").expect("valid selector");

        let name = document
            .select(&name_sel)
            .next()
            .map(|e| clean_text(&e.text().collect::<String>()))
            .unwrap_or_default();
        let price = document
            .select(&price_sel)
            .next()
            .map(|e| parse_price(&e.text().collect::<String>()))
            .unwrap_or(0.0);
        let original_price = document
            .select(&original_sel)
            .next()
            .map(|e| parse_price(&e.text().collect::<String>()))
            .filter(|p| *p > 0.0);
        let image_url = document
            .select(&image_sel)
            .next()
            .and_then(|img| img.value().attr("src"))
            .map(|src| complete_url(&self.base_url, src));

        let mut specs = std::collections::BTreeMap::new();
        for row in document.select(&spec_row_sel) {
            let key = row
                .select(&spec_key_sel)
                .next()
                .map(|e| clean_text(&e.text().collect::<String>()))
                .unwrap_or_default();
            let value = row
                .select(&spec_value_sel)
                .next()
                .map(|e| clean_text(&e.text().collect::<String>()))
                .unwrap_or_default();
            if !key.is_empty() && !value.is_empty() {
                specs.insert(key, serde_json::json!(value));
            }
        }

        let result = ProductResult {
            name,
            price,
            original_price,
            image_url,
            product_url: url.to_owned(),
            platform: self.platform_name().to_owned(),
            rating: None,
            review_count: None,
            sales_volume: None,
            shipping_fee: Some(0.0),
            stock_status: Some(StockStatus::Available),
            vendor_name: None,
            specs,
        };
        result.is_listable().then_some(result)
    }
}

#[async_trait]
impl PlatformCrawler for PchomeCrawler {
    fn platform_id(&self) -> &'static str {
        "pchome"
    }

    fn platform_name(&self) -> &'static str {
        "PChome"
    }

    fn matches_url(&self, url: &str) -> bool {
        url.contains("pchome.com.tw")
    }

    async fn search(
        &self,
        keyword: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<ProductResult>, CrawlerError> {
        let url = self.search_url(keyword, filters);
        let html = self.fetch_html_with_retry(&url).await?;
        Ok(self.parse_search_results(&html))
    }

    async fn product_details(&self, url: &str) -> Result<Option<ProductResult>, CrawlerError> {
        let html = self.fetch_html_with_retry(url).await?;
        Ok(self.parse_product_details(&html, url))
    }
}
