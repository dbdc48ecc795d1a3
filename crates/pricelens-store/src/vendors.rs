//! Vendor contact book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::repository::Repository;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorContact {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VendorContact {
    /// A fresh contact with only a name; the rest is filled in by the caller.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            platform: None,
            contact_person: None,
            email: None,
            phone: None,
            address: None,
            website: None,
            rating: None,
            notes: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

pub struct VendorsStore {
    repo: Box<dyn Repository<VendorContact>>,
}

impl VendorsStore {
    #[must_use]
    pub fn new(repo: Box<dyn Repository<VendorContact>>) -> Self {
        Self { repo }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read.
    pub fn list(&self) -> Result<Vec<VendorContact>, StoreError> {
        self.repo.load()
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read.
    pub fn by_platform(&self, platform: &str) -> Result<Vec<VendorContact>, StoreError> {
        Ok(self
            .repo
            .load()?
            .into_iter()
            .filter(|v| v.platform.as_deref() == Some(platform))
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read or
    /// written.
    pub fn add(&self, vendor: VendorContact) -> Result<(), StoreError> {
        let mut vendors = self.repo.load()?;
        vendors.push(vendor);
        self.repo.save(&vendors)
    }

    /// Replaces the stored contact with the same id, bumping `updated_at`.
    /// Returns `true` when a contact was updated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read or
    /// written.
    pub fn update(&self, mut vendor: VendorContact) -> Result<bool, StoreError> {
        let mut vendors = self.repo.load()?;
        let Some(slot) = vendors.iter_mut().find(|v| v.id == vendor.id) else {
            return Ok(false);
        };
        vendor.updated_at = Utc::now();
        *slot = vendor;
        self.repo.save(&vendors)?;
        Ok(true)
    }

    /// Removes a contact by id. Returns `true` when something was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read or
    /// written.
    pub fn remove(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut vendors = self.repo.load()?;
        let before = vendors.len();
        vendors.retain(|v| v.id != id);
        if vendors.len() == before {
            return Ok(false);
        }
        self.repo.save(&vendors)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    fn store() -> VendorsStore {
        VendorsStore::new(Box::new(MemoryRepository::new()))
    }

    #[test]
    fn add_and_list() {
        let store = store();
        store.add(VendorContact::new("佛山電器廠")).unwrap();
        let vendors = store.list().unwrap();
        assert_eq!(vendors.len(), 1);
        assert_eq!(vendors[0].name, "佛山電器廠");
    }

    #[test]
    fn filter_by_platform() {
        let store = store();
        let mut a = VendorContact::new("A");
        a.platform = Some("1688".to_owned());
        let b = VendorContact::new("B");
        store.add(a).unwrap();
        store.add(b).unwrap();

        let filtered = store.by_platform("1688").unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "A");
    }

    #[test]
    fn update_replaces_and_bumps_timestamp() {
        let store = store();
        let vendor = VendorContact::new("A");
        let created = vendor.updated_at;
        store.add(vendor.clone()).unwrap();

        let mut edited = vendor;
        edited.email = Some("sales@example.test".to_owned());
        assert!(store.update(edited).unwrap());

        let stored = &store.list().unwrap()[0];
        assert_eq!(stored.email.as_deref(), Some("sales@example.test"));
        assert!(stored.updated_at >= created);
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let store = store();
        assert!(!store.update(VendorContact::new("ghost")).unwrap());
    }

    #[test]
    fn remove_by_id() {
        let store = store();
        let vendor = VendorContact::new("A");
        let id = vendor.id;
        store.add(vendor).unwrap();
        assert!(store.remove(id).unwrap());
        assert!(store.list().unwrap().is_empty());
    }
}
