//! The collection-persistence seam and its two backends.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Whole-collection persistence: read everything, rewrite everything.
///
/// Collections here are small (favorites, alerts, a capped history), so the
/// simplicity of full rewrites beats incremental updates. Implementations
/// must tolerate a collection that has never been saved by returning an
/// empty list.
pub trait Repository<T>: Send + Sync {
    /// Loads the full collection; an absent backing store is an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store exists but cannot be
    /// read or parsed.
    fn load(&self) -> Result<Vec<T>, StoreError>;

    /// Replaces the full collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backing store cannot be written.
    fn save(&self, items: &[T]) -> Result<(), StoreError>;
}

/// One JSON array per file. Missing file loads as empty; parent directories
/// are created on first save.
pub struct JsonFileRepository<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileRepository<T> {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    fn path_string(&self) -> String {
        self.path.display().to_string()
    }
}

impl<T> Repository<T> for JsonFileRepository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn load(&self) -> Result<Vec<T>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path_string(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|source| StoreError::Json {
            path: self.path_string(),
            source,
        })
    }

    fn save(&self, items: &[T]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: self.path_string(),
                source,
            })?;
        }
        let raw = serde_json::to_string_pretty(items).map_err(|source| StoreError::Json {
            path: self.path_string(),
            source,
        })?;
        std::fs::write(&self.path, raw).map_err(|source| StoreError::Io {
            path: self.path_string(),
            source,
        })
    }
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryRepository<T> {
    items: Mutex<Vec<T>>,
}

impl<T: Clone> MemoryRepository<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }
}

impl<T> Repository<T> for MemoryRepository<T>
where
    T: Clone + Send + Sync,
{
    fn load(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.items.lock().expect("repository mutex poisoned").clone())
    }

    fn save(&self, items: &[T]) -> Result<(), StoreError> {
        *self.items.lock().expect("repository mutex poisoned") = items.to_vec();
        Ok(())
    }
}
