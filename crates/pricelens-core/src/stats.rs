//! Derived aggregates for the display layer.

use std::collections::BTreeSet;

use crate::product::ProductResult;

/// Summary figures over the current (already filtered) result set.
///
/// Recomputed in full whenever the input set changes; result sets are at
/// most a few hundred records, so a full pass is the whole contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultStats {
    /// Lowest current price in the set, `None` when the set is empty.
    pub lowest_price: Option<f64>,
    /// Highest sales volume in the set, counting missing volumes as absent.
    pub highest_sales: Option<u64>,
    /// Number of distinct platforms represented.
    pub platform_count: usize,
}

impl ResultStats {
    #[must_use]
    pub fn compute(results: &[ProductResult]) -> Self {
        let lowest_price = results
            .iter()
            .map(|r| r.price)
            .min_by(f64::total_cmp);
        let highest_sales = results.iter().filter_map(|r| r.sales_volume).max();
        let platform_count = results
            .iter()
            .map(|r| r.platform.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            lowest_price,
            highest_sales,
            platform_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(platform: &str, price: f64, sales: Option<u64>) -> ProductResult {
        ProductResult {
            name: "item".to_owned(),
            price,
            original_price: None,
            image_url: None,
            product_url: "https://example.test/item".to_owned(),
            platform: platform.to_owned(),
            rating: None,
            review_count: None,
            sales_volume: sales,
            shipping_fee: None,
            stock_status: None,
            vendor_name: None,
            specs: std::collections::BTreeMap::new(),
        }
    }

    #[test]
    fn empty_set_has_no_extremes() {
        let stats = ResultStats::compute(&[]);
        assert!(stats.lowest_price.is_none());
        assert!(stats.highest_sales.is_none());
        assert_eq!(stats.platform_count, 0);
    }

    #[test]
    fn computes_extremes_and_distinct_platforms() {
        let results = vec![
            make_result("Shopee", 299.0, Some(120)),
            make_result("Shopee", 350.0, None),
            make_result("PChome", 310.0, Some(4500)),
        ];
        let stats = ResultStats::compute(&results);
        assert_eq!(stats.lowest_price, Some(299.0));
        assert_eq!(stats.highest_sales, Some(4500));
        assert_eq!(stats.platform_count, 2);
    }
}
