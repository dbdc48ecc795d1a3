//! Saved products, deduplicated by their real-world identity: the product
//! page URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricelens_core::ProductResult;

use crate::error::StoreError;
use crate::repository::Repository;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub product: ProductResult,
    pub added_at: DateTime<Utc>,
}

pub struct FavoritesStore {
    repo: Box<dyn Repository<FavoriteItem>>,
}

impl FavoritesStore {
    #[must_use]
    pub fn new(repo: Box<dyn Repository<FavoriteItem>>) -> Self {
        Self { repo }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read.
    pub fn list(&self) -> Result<Vec<FavoriteItem>, StoreError> {
        self.repo.load()
    }

    /// Adds a product unless one with the same `product_url` is already
    /// saved. Returns `true` when the product was added.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read or
    /// written.
    pub fn add(&self, product: ProductResult) -> Result<bool, StoreError> {
        let mut items = self.repo.load()?;
        if items
            .iter()
            .any(|f| f.product.product_url == product.product_url)
        {
            return Ok(false);
        }
        items.push(FavoriteItem {
            product,
            added_at: Utc::now(),
        });
        self.repo.save(&items)?;
        Ok(true)
    }

    /// Removes the favorite with the given product URL. Returns `true` when
    /// something was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read or
    /// written.
    pub fn remove(&self, product_url: &str) -> Result<bool, StoreError> {
        let mut items = self.repo.load()?;
        let before = items.len();
        items.retain(|f| f.product.product_url != product_url);
        if items.len() == before {
            return Ok(false);
        }
        self.repo.save(&items)?;
        Ok(true)
    }
}
