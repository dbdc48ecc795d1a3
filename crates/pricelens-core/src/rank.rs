//! Pure ranking and filtering over in-memory result sets.
//!
//! The display layer re-runs these whenever the result set or the selected
//! ordering changes; nothing here is incrementally maintained.

use serde::{Deserialize, Serialize};

use crate::product::ProductResult;

/// Orderings available to the display layer. Unlike
/// [`SortKey`](crate::product::SortKey) these are applied locally to an
/// already-merged result set, so `discount` is available and `relevance`
/// is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrdering {
    Price,
    Sales,
    Rating,
    Discount,
}

/// Discount percentage for an `original` → `current` price drop, rounded to
/// the nearest whole percent. Returns `0` when `original` is zero or
/// negative so absent pre-discount prices never divide by zero.
#[must_use]
pub fn calculate_discount(original: f64, current: f64) -> i64 {
    if original <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation)]
    let percent = (((original - current) / original) * 100.0).round() as i64;
    percent
}

/// Filters by platform then sorts a copy of `results`.
///
/// `platform_filter` of `None` or `"all"` retains everything; a platform
/// name retains only exact matches (a name absent from the input yields an
/// empty list). The price ordering is ascending and stable — equal prices
/// keep their relative input order; sales, rating, and discount are
/// descending with missing values treated as zero.
#[must_use]
pub fn rank_results(
    results: &[ProductResult],
    ordering: ResultOrdering,
    platform_filter: Option<&str>,
) -> Vec<ProductResult> {
    let mut ranked: Vec<ProductResult> = match platform_filter {
        Some(platform) if platform != "all" => results
            .iter()
            .filter(|r| r.platform == platform)
            .cloned()
            .collect(),
        _ => results.to_vec(),
    };

    match ordering {
        ResultOrdering::Price => ranked.sort_by(|a, b| a.price.total_cmp(&b.price)),
        ResultOrdering::Sales => ranked.sort_by(|a, b| {
            b.sales_volume
                .unwrap_or(0)
                .cmp(&a.sales_volume.unwrap_or(0))
        }),
        ResultOrdering::Rating => ranked.sort_by(|a, b| {
            b.rating
                .unwrap_or(0.0)
                .total_cmp(&a.rating.unwrap_or(0.0))
        }),
        ResultOrdering::Discount => {
            ranked.sort_by(|a, b| b.discount_percent().cmp(&a.discount_percent()));
        }
    }

    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(name: &str, platform: &str, price: f64) -> ProductResult {
        ProductResult {
            name: name.to_owned(),
            price,
            original_price: None,
            image_url: None,
            product_url: format!("https://example.test/{name}"),
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

    // -----------------------------------------------------------------------
    // calculate_discount
    // -----------------------------------------------------------------------

    #[test]
    fn discount_1000_to_750_is_25_percent() {
        assert_eq!(calculate_discount(1000.0, 750.0), 25);
    }

    #[test]
    fn discount_guards_zero_original() {
        assert_eq!(calculate_discount(0.0, 750.0), 0);
    }

    #[test]
    fn discount_guards_negative_original() {
        assert_eq!(calculate_discount(-10.0, 5.0), 0);
    }

    #[test]
    fn discount_rounds_to_nearest_percent() {
        // 1/3 off => 33.33…% => 33
        assert_eq!(calculate_discount(300.0, 200.0), 33);
        // 2/3 off => 66.66…% => 67
        assert_eq!(calculate_discount(300.0, 100.0), 67);
    }

    // -----------------------------------------------------------------------
    // rank_results
    // -----------------------------------------------------------------------

    #[test]
    fn price_sort_is_ascending_and_stable() {
        let results = vec![
            make_result("b", "Shopee", 200.0),
            make_result("a1", "PChome", 100.0),
            make_result("a2", "Momo", 100.0),
            make_result("c", "Shopee", 300.0),
        ];
        let ranked = rank_results(&results, ResultOrdering::Price, None);
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        // a1 and a2 share a price and must keep their input order.
        assert_eq!(names, vec!["a1", "a2", "b", "c"]);
    }

    #[test]
    fn sales_sort_is_descending_with_missing_as_zero() {
        let mut high = make_result("high", "Shopee", 10.0);
        high.sales_volume = Some(500);
        let mut low = make_result("low", "Shopee", 10.0);
        low.sales_volume = Some(3);
        let missing = make_result("missing", "Shopee", 10.0);

        let ranked = rank_results(
            &[missing.clone(), low.clone(), high.clone()],
            ResultOrdering::Sales,
            None,
        );
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["high", "low", "missing"]);
    }

    #[test]
    fn rating_sort_is_descending_with_missing_as_zero() {
        let mut good = make_result("good", "Shopee", 10.0);
        good.rating = Some(4.8);
        let mut ok = make_result("ok", "Shopee", 10.0);
        ok.rating = Some(3.1);
        let unrated = make_result("unrated", "Shopee", 10.0);

        let ranked = rank_results(
            &[unrated, ok, good],
            ResultOrdering::Rating,
            None,
        );
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["good", "ok", "unrated"]);
    }

    #[test]
    fn discount_sort_treats_missing_original_as_zero() {
        let mut half_off = make_result("half", "Shopee", 500.0);
        half_off.original_price = Some(1000.0);
        let mut ten_off = make_result("ten", "Shopee", 900.0);
        ten_off.original_price = Some(1000.0);
        let full_price = make_result("full", "Shopee", 100.0);

        let ranked = rank_results(
            &[full_price, ten_off, half_off],
            ResultOrdering::Discount,
            None,
        );
        let names: Vec<&str> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["half", "ten", "full"]);
    }

    #[test]
    fn filter_by_platform_retains_only_matches() {
        let results = vec![
            make_result("a", "Shopee", 100.0),
            make_result("b", "PChome", 50.0),
            make_result("c", "Shopee", 30.0),
        ];
        let ranked = rank_results(&results, ResultOrdering::Price, Some("Shopee"));
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|r| r.platform == "Shopee"));
        assert_eq!(ranked[0].name, "c");
    }

    #[test]
    fn filter_by_unknown_platform_yields_empty() {
        let results = vec![make_result("a", "Shopee", 100.0)];
        let ranked = rank_results(&results, ResultOrdering::Price, Some("Yahoo"));
        assert!(ranked.is_empty());
    }

    #[test]
    fn filter_all_returns_everything_sorted() {
        let results = vec![
            make_result("a", "Shopee", 200.0),
            make_result("b", "PChome", 100.0),
        ];
        let ranked = rank_results(&results, ResultOrdering::Price, Some("all"));
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "b");
    }
}
