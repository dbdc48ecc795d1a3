//! Search history: newest first, capped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::repository::Repository;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Keywords that were actually searched (batch runs record several).
    pub keywords: Vec<String>,
    /// Platform ids the search fanned out to.
    pub platforms: Vec<String>,
    pub result_count: usize,
    pub searched_at: DateTime<Utc>,
}

pub struct HistoryStore {
    repo: Box<dyn Repository<HistoryEntry>>,
    max_entries: usize,
}

impl HistoryStore {
    #[must_use]
    pub fn new(repo: Box<dyn Repository<HistoryEntry>>, max_entries: usize) -> Self {
        Self { repo, max_entries }
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read.
    pub fn list(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        self.repo.load()
    }

    /// Prepends a new entry and drops everything past the cap.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be read or
    /// written.
    pub fn record(
        &self,
        keywords: Vec<String>,
        platforms: Vec<String>,
        result_count: usize,
    ) -> Result<(), StoreError> {
        let mut entries = self.repo.load()?;
        entries.insert(
            0,
            HistoryEntry {
                keywords,
                platforms,
                result_count,
                searched_at: Utc::now(),
            },
        );
        entries.truncate(self.max_entries);
        self.repo.save(&entries)
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be written.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.repo.save(&[])
    }
}
