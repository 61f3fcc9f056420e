//! Persisted dismissal list.
//!
//! Dismissed ids are stored as one JSON array under a single key of a
//! [`KeyValueStore`]. [`DismissedCache`] keeps the decoded list in memory
//! after the first read until it is explicitly invalidated.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::StoreError;

/// Default key the dismissal list is stored under.
pub const DISMISSED_KEY: &str = "dismissedFeedItems";

/// String key-value persistence.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }
}

/// Process-local store, mainly for tests.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .values
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// In-memory view of the persisted dismissal list.
#[derive(Debug, Clone)]
pub struct DismissedCache {
    key: String,
    /// `None` until first loaded.
    loaded: Option<Loaded>,
}

#[derive(Debug, Clone, Default)]
struct Loaded {
    order: Vec<String>,
    ids: HashSet<String>,
}

impl DismissedCache {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            loaded: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Drop the cached list; the next access reads the store again.
    pub fn invalidate(&mut self) {
        self.loaded = None;
    }

    /// Read the list from `store` unless it is already cached.
    ///
    /// # Errors
    ///
    /// Store failures and a persisted value that is not a JSON string array.
    pub async fn load(&mut self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        if self.loaded.is_some() {
            return Ok(());
        }
        let order: Vec<String> = match store.get(&self.key).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                key: self.key.clone(),
                source,
            })?,
            None => Vec::new(),
        };
        let ids = order.iter().cloned().collect();
        self.loaded = Some(Loaded { order, ids });
        Ok(())
    }

    /// Whether `id` is dismissed. Always false before [`load`](Self::load).
    pub fn contains(&self, id: &str) -> bool {
        self.loaded.as_ref().is_some_and(|l| l.ids.contains(id))
    }

    /// Dismissed ids in dismissal order.
    pub fn ids(&self) -> &[String] {
        self.loaded.as_ref().map(|l| l.order.as_slice()).unwrap_or(&[])
    }

    /// Record `id` as dismissed and persist the full list right away.
    ///
    /// Returns false if it was already dismissed (nothing is written).
    pub async fn dismiss(&mut self, store: &dyn KeyValueStore, id: &str) -> Result<bool, StoreError> {
        self.load(store).await?;
        if self.contains(id) {
            return Ok(false);
        }

        // Commit to the cache only once the store has the new list.
        let mut order = self.ids().to_vec();
        order.push(id.to_string());
        let raw = serde_json::to_string(&order).map_err(|source| StoreError::Corrupt {
            key: self.key.clone(),
            source,
        })?;
        store.set(&self.key, &raw).await?;

        let loaded = self.loaded.get_or_insert_with(Loaded::default);
        loaded.ids.insert(id.to_string());
        loaded.order = order;
        Ok(true)
    }
}

impl Default for DismissedCache {
    fn default() -> Self {
        Self::new(DISMISSED_KEY)
    }
}
