//! Price alerts: fire when a fresh search result for the watched product
//! URL lands at or below the target price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pricelens_core::ProductResult;

use crate::error::StoreError;
use crate::repository::Repository;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceAlert {
    pub id: Uuid,
    pub product_name: String,
    pub product_url: String,
    pub platform: String,
    pub target_price: f64,
    pub created_at: DateTime<Utc>,
    /// Set once, the first time the target is met. Triggered alerts are
    /// kept for display rather than deleted.
    pub triggered_at: Option<DateTime<Utc>>,
}

impl PriceAlert {
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered_at.is_some()
    }
}

pub struct AlertsStore {
    repo: Box<dyn Repository<PriceAlert>>,
}

impl AlertsStore {
    #[must_use]
    pub fn new(repo: Box<dyn Repository<PriceAlert>>) -> Self {
        Self { repo }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read.
    pub fn list(&self) -> Result<Vec<PriceAlert>, StoreError> {
        self.repo.load()
    }

    /// Creates an alert watching `product` at `target_price`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read or
    /// written.
    pub fn add(
        &self,
        product: &ProductResult,
        target_price: f64,
    ) -> Result<PriceAlert, StoreError> {
        let alert = PriceAlert {
            id: Uuid::new_v4(),
            product_name: product.name.clone(),
            product_url: product.product_url.clone(),
            platform: product.platform.clone(),
            target_price,
            created_at: Utc::now(),
            triggered_at: None,
        };
        let mut alerts = self.repo.load()?;
        alerts.push(alert.clone());
        self.repo.save(&alerts)?;
        Ok(alert)
    }

    /// Removes an alert by id. Returns `true` when something was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read or
    /// written.
    pub fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut alerts = self.repo.load()?;
        let before = alerts.len();
        alerts.retain(|a| a.id != id);
        if alerts.len() == before {
            return Ok(false);
        }
        self.repo.save(&alerts)?;
        Ok(true)
    }

    /// Marks every untriggered alert whose product URL appears in `results`
    /// at or below its target price, and returns the newly triggered
    /// alerts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read or
    /// written.
    pub fn check(&self, results: &[ProductResult]) -> Result<Vec<PriceAlert>, StoreError> {
        let mut alerts = self.repo.load()?;
        let mut fired = Vec::new();

        for alert in &mut alerts {
            if alert.is_triggered() {
                continue;
            }
            let hit = results
                .iter()
                .any(|r| r.product_url == alert.product_url && r.price <= alert.target_price);
            if hit {
                alert.triggered_at = Some(Utc::now());
                fired.push(alert.clone());
            }
        }

        if !fired.is_empty() {
            self.repo.save(&alerts)?;
        }
        Ok(fired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    fn make_product(url: &str, price: f64) -> ProductResult {
        ProductResult {
            name: "item".to_owned(),
            price,
            original_price: None,
            image_url: None,
            product_url: url.to_owned(),
            platform: "Shopee".to_owned(),
            rating: None,
            review_count: None,
            sales_volume: None,
            shipping_fee: None,
            stock_status: None,
            vendor_name: None,
            specs: std::collections::BTreeMap::new(),
        }
    }

    fn store() -> AlertsStore {
        AlertsStore::new(Box::new(MemoryRepository::new()))
    }

    #[test]
    fn alert_fires_at_or_below_target() {
        let store = store();
        store
            .add(&make_product("https://shopee.tw/p/1", 1200.0), 1000.0)
            .unwrap();

        let not_yet = store.check(&[make_product("https://shopee.tw/p/1", 1100.0)]);
        assert!(not_yet.unwrap().is_empty(), "above target must not fire");

        let fired = store
            .check(&[make_product("https://shopee.tw/p/1", 1000.0)])
            .unwrap();
        assert_eq!(fired.len(), 1, "exactly at target fires");
        assert!(fired[0].is_triggered());
    }

    #[test]
    fn triggered_alert_does_not_fire_twice() {
        let store = store();
        store
            .add(&make_product("https://shopee.tw/p/1", 1200.0), 1000.0)
            .unwrap();
        let first = store
            .check(&[make_product("https://shopee.tw/p/1", 900.0)])
            .unwrap();
        assert_eq!(first.len(), 1);
        let second = store
            .check(&[make_product("https://shopee.tw/p/1", 800.0)])
            .unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn alert_matches_by_url_not_name() {
        let store = store();
        store
            .add(&make_product("https://shopee.tw/p/1", 1200.0), 1000.0)
            .unwrap();
        let fired = store
            .check(&[make_product("https://shopee.tw/p/other", 500.0)])
            .unwrap();
        assert!(fired.is_empty());
    }

    #[test]
    fn remove_by_id() {
        let store = store();
        let alert = store
            .add(&make_product("https://shopee.tw/p/1", 1200.0), 1000.0)
            .unwrap();
        assert!(store.remove(alert.id).unwrap());
        assert!(!store.remove(alert.id).unwrap());
        assert!(store.list().unwrap().is_empty());
    }
}
