//! The normalized cross-platform product record and per-search filters.
//!
//! Every platform crawler emits [`ProductResult`] regardless of how the
//! upstream response is shaped. Prices are `f64` at this boundary; the
//! persistence layer converts to fixed-scale `NUMERIC` columns on write.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A product offer normalized from one platform's search or detail response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResult {
    /// Display name, whitespace-collapsed. Never empty for emitted records.
    pub name: String,
    /// Current price in the platform's display currency (TWD for the
    /// Taiwanese platforms, CNY for 1688). Always `> 0` for emitted records.
    pub price: f64,
    /// Pre-discount price, when the platform advertises one. Expected to be
    /// `>= price` for the discount computation to be meaningful; crawlers
    /// pass the upstream value through without enforcing that.
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Canonical product page URL. Never empty for emitted records; doubles
    /// as the real-world identity key when deduplicating favorites.
    pub product_url: String,
    /// Display name of the originating platform, e.g. `"Shopee"`.
    pub platform: String,
    /// Rating on a 0–5 scale. Crawlers emit it already normalized.
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u64>,
    #[serde(default)]
    pub sales_volume: Option<u64>,
    #[serde(default)]
    pub shipping_fee: Option<f64>,
    #[serde(default)]
    pub stock_status: Option<StockStatus>,
    #[serde(default)]
    pub vendor_name: Option<String>,
    /// Free-form platform attributes (shop ids, minimum order quantity, …).
    #[serde(default)]
    pub specs: BTreeMap<String, serde_json::Value>,
}

impl ProductResult {
    /// Returns `true` when the record satisfies the adapter-boundary
    /// invariant: non-empty name, positive price, non-empty product URL.
    /// Records failing this are dropped silently before a crawler returns.
    #[must_use]
    pub fn is_listable(&self) -> bool {
        !self.name.is_empty() && self.price > 0.0 && !self.product_url.is_empty()
    }

    /// Discount percentage against `original_price`, `0` when absent.
    #[must_use]
    pub fn discount_percent(&self) -> i64 {
        self.original_price
            .map_or(0, |original| crate::rank::calculate_discount(original, self.price))
    }
}

/// Availability as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    Available,
    OutOfStock,
}

impl StockStatus {
    /// The wire/storage spelling, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StockStatus::Available => "available",
            StockStatus::OutOfStock => "out_of_stock",
        }
    }
}

/// Caller-supplied sort/pagination/price-bound configuration for one search.
///
/// Interpretation is adapter-specific: each crawler maps `sort_by` to its
/// platform's native parameter and direction, and there is no cross-adapter
/// guarantee of identical semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub min_sales: Option<u64>,
    #[serde(default)]
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub sort_by: Option<SortKey>,
    /// 0-based page index; adapters that count pages from 1 shift it.
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Server-side orderings a caller may request from a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Price,
    Sales,
    Rating,
    Relevance,
}
