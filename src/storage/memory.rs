use super::{Result, Storage, StorageError};
use crate::models::Mapping;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;

/// Thread-safe in-memory [`Storage`] keyed by short code.
///
/// Backed by a DashMap; inserts go through the entry API so a code is claimed
/// atomically under its shard lock. Lookups by URL scan every entry, which is
/// fine for tests and small ephemeral deployments.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, Mapping>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored mappings.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn find_by_code(&self, code: &str) -> Result<Option<Mapping>> {
        Ok(self.inner.get(code).map(|m| m.clone()))
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Mapping>> {
        Ok(self
            .inner
            .iter()
            .filter(|entry| entry.url == url)
            .min_by_key(|entry| entry.created_at)
            .map(|entry| entry.value().clone()))
    }

    async fn insert(&self, mapping: Mapping) -> Result<Mapping> {
        match self.inner.entry(mapping.short_code.clone()) {
            Entry::Occupied(_) => Err(StorageError::CodeTaken(mapping.short_code)),
            Entry::Vacant(slot) => {
                slot.insert(mapping.clone());
                Ok(mapping)
            }
        }
    }

    async fn update_url(&self, code: &str, url: &str) -> Result<Option<Mapping>> {
        Ok(self.inner.get_mut(code).map(|mut entry| {
            entry.url = url.to_owned();
            entry.updated_at = Utc::now();
            entry.clone()
        }))
    }

    async fn increment_access_count(&self, code: &str) -> Result<bool> {
        match self.inner.get_mut(code) {
            Some(mut entry) => {
                entry.access_count += 1;
                entry.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_by_code(&self, code: &str) -> Result<bool> {
        Ok(self.inner.remove(code).is_some())
    }
}
