//! Persistence contract the mapping service depends on, plus the SQLite and
//! in-memory backends that implement it.

pub mod memory;
pub mod sqlite;

use crate::models::Mapping;
use async_trait::async_trait;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Another mapping already owns this short code. Raised atomically by
    /// `insert`; never by a separate existence check.
    #[error("short code '{0}' is already taken")]
    CodeTaken(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Failure reported by a backend that does not speak sqlx. Neither
    /// built-in store raises it.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Key-value style store for [`Mapping`]s.
///
/// Every method is a single atomic operation on one record. `None` / `false`
/// means no mapping has the given key.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn find_by_code(&self, code: &str) -> Result<Option<Mapping>>;

    async fn find_by_url(&self, url: &str) -> Result<Option<Mapping>>;

    /// Persist a new mapping. Fails with [`StorageError::CodeTaken`] if its
    /// short code is in use; two rows never share a code.
    async fn insert(&self, mapping: Mapping) -> Result<Mapping>;

    /// Replace the destination URL and refresh `updated_at`.
    ///
    /// Backends may return the record as it was before the write; callers
    /// reconcile the snapshot themselves.
    async fn update_url(&self, code: &str, url: &str) -> Result<Option<Mapping>>;

    /// Add one to the access count and refresh `updated_at`.
    async fn increment_access_count(&self, code: &str) -> Result<bool>;

    async fn delete_by_code(&self, code: &str) -> Result<bool>;
}
