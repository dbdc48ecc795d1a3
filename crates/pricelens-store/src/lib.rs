//! Local persistence for user state: favorites, search history, price
//! alerts, and vendor contacts.
//!
//! Everything goes through the [`Repository`] seam — a whole-collection
//! `load`/`save` pair — so the stores can run against JSON files in
//! production and an in-memory fake in tests. Each collection lives in one
//! file under the data directory and is rewritten in full on every
//! mutation; there is no partial update and no migration story, matching
//! the browser-local-storage model this replaces.

pub mod alerts;
pub mod error;
pub mod favorites;
pub mod history;
pub mod repository;
pub mod vendors;

use std::path::Path;

pub use alerts::{AlertsStore, PriceAlert};
pub use error::StoreError;
pub use favorites::{FavoriteItem, FavoritesStore};
pub use history::{HistoryEntry, HistoryStore};
pub use repository::{JsonFileRepository, MemoryRepository, Repository};
pub use vendors::{VendorContact, VendorsStore};

/// The JSON-file-backed store set, one file per collection.
pub struct Stores {
    pub favorites: FavoritesStore,
    pub history: HistoryStore,
    pub alerts: AlertsStore,
    pub vendors: VendorsStore,
}

impl Stores {
    /// Opens every store under `data_dir` with its fixed file name.
    /// Files are created lazily on first save.
    #[must_use]
    pub fn open(data_dir: &Path, history_max_entries: usize) -> Self {
        Self {
            favorites: FavoritesStore::new(Box::new(JsonFileRepository::new(
                data_dir.join("favorites.json"),
            ))),
            history: HistoryStore::new(
                Box::new(JsonFileRepository::new(data_dir.join("search-history.json"))),
                history_max_entries,
            ),
            alerts: AlertsStore::new(Box::new(JsonFileRepository::new(
                data_dir.join("price-alerts.json"),
            ))),
            vendors: VendorsStore::new(Box::new(JsonFileRepository::new(
                data_dir.join("vendors.json"),
            ))),
        }
    }
}
