#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::sqlite::SqlitePoolOptions;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tinylink::{
    generator::{CodeGenerator, SeededGenerator},
    models::Mapping,
    recorder::AccessRecorder,
    service::MappingService,
    storage::{self, SqliteStore, Storage, StorageError},
};

/// Hands out the scripted codes in order, then falls back to a seeded source.
pub struct ScriptedGenerator {
    codes: Mutex<VecDeque<String>>,
    fallback: SeededGenerator,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            codes: Mutex::new(codes.iter().map(|c| c.to_string()).collect()),
            fallback: SeededGenerator::new(99),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CodeGenerator for ScriptedGenerator {
    fn generate(&self) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.codes
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.generate())
    }
}

/// Always returns the same code.
pub struct FixedGenerator {
    code: String,
    calls: AtomicUsize,
}

impl FixedGenerator {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_owned(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CodeGenerator for FixedGenerator {
    fn generate(&self) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.code.clone()
    }
}

/// Cycles through a small fixed pool so concurrent creators collide a lot.
pub struct PoolGenerator {
    pool: Vec<String>,
    next: AtomicUsize,
}

impl PoolGenerator {
    pub fn new(pool: &[&str]) -> Self {
        Self {
            pool: pool.iter().map(|c| c.to_string()).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

impl CodeGenerator for PoolGenerator {
    fn generate(&self) -> String {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        self.pool[i % self.pool.len()].clone()
    }
}

/// Store whose writes fail with a backend error. Reads find nothing.
#[derive(Default)]
pub struct BrokenStore {
    pub inserts: AtomicUsize,
}

#[async_trait]
impl Storage for BrokenStore {
    async fn find_by_code(&self, _code: &str) -> storage::Result<Option<Mapping>> {
        Ok(None)
    }

    async fn find_by_url(&self, _url: &str) -> storage::Result<Option<Mapping>> {
        Ok(None)
    }

    async fn insert(&self, _mapping: Mapping) -> storage::Result<Mapping> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Err(StorageError::Backend("disk full".into()))
    }

    async fn update_url(&self, _code: &str, _url: &str) -> storage::Result<Option<Mapping>> {
        Err(StorageError::Backend("disk full".into()))
    }

    async fn increment_access_count(&self, _code: &str) -> storage::Result<bool> {
        Err(StorageError::Backend("disk full".into()))
    }

    async fn delete_by_code(&self, _code: &str) -> storage::Result<bool> {
        Err(StorageError::Backend("disk full".into()))
    }
}

/// Delegates to an inner store but answers `update_url` with the record as it
/// was before the write, like a find-and-modify that returns the old document.
pub struct StaleUpdateStore<S> {
    pub inner: S,
}

#[async_trait]
impl<S: Storage> Storage for StaleUpdateStore<S> {
    async fn find_by_code(&self, code: &str) -> storage::Result<Option<Mapping>> {
        self.inner.find_by_code(code).await
    }

    async fn find_by_url(&self, url: &str) -> storage::Result<Option<Mapping>> {
        self.inner.find_by_url(url).await
    }

    async fn insert(&self, mapping: Mapping) -> storage::Result<Mapping> {
        self.inner.insert(mapping).await
    }

    async fn update_url(&self, code: &str, url: &str) -> storage::Result<Option<Mapping>> {
        let before = self.inner.find_by_code(code).await?;
        if before.is_some() {
            self.inner.update_url(code, url).await?;
        }
        Ok(before)
    }

    async fn increment_access_count(&self, code: &str) -> storage::Result<bool> {
        self.inner.increment_access_count(code).await
    }

    async fn delete_by_code(&self, code: &str) -> storage::Result<bool> {
        self.inner.delete_by_code(code).await
    }
}

/// Delegates to an inner store, sleeping `delay` before every lookup by code
/// and every access-count increment.
pub struct SlowStore<S> {
    pub inner: S,
    pub delay: Duration,
}

#[async_trait]
impl<S: Storage> Storage for SlowStore<S> {
    async fn find_by_code(&self, code: &str) -> storage::Result<Option<Mapping>> {
        tokio::time::sleep(self.delay).await;
        self.inner.find_by_code(code).await
    }

    async fn find_by_url(&self, url: &str) -> storage::Result<Option<Mapping>> {
        self.inner.find_by_url(url).await
    }

    async fn insert(&self, mapping: Mapping) -> storage::Result<Mapping> {
        self.inner.insert(mapping).await
    }

    async fn update_url(&self, code: &str, url: &str) -> storage::Result<Option<Mapping>> {
        self.inner.update_url(code, url).await
    }

    async fn increment_access_count(&self, code: &str) -> storage::Result<bool> {
        tokio::time::sleep(self.delay).await;
        self.inner.increment_access_count(code).await
    }

    async fn delete_by_code(&self, code: &str) -> storage::Result<bool> {
        self.inner.delete_by_code(code).await
    }
}

pub fn service_with(store: Arc<dyn Storage>, generator: Arc<dyn CodeGenerator>) -> MappingService {
    let (recorder, _worker) = AccessRecorder::spawn(store.clone(), Duration::from_secs(3), 64);
    MappingService::new(store, generator, recorder)
}

pub async fn sqlite_store() -> SqliteStore {
    // One long-lived connection: every query must see the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory SQLite");
    let store = SqliteStore::new(pool);
    store.migrate().await.expect("migrations");
    store
}

/// Poll until the access count of `code` reaches `expected` (or two seconds pass)
/// and return the last value seen.
pub async fn wait_for_count(store: &dyn Storage, code: &str, expected: i64) -> i64 {
    let mut seen = -1;
    for _ in 0..100 {
        seen = store
            .find_by_code(code)
            .await
            .unwrap()
            .map(|m| m.access_count)
            .unwrap_or(-1);
        if seen >= expected {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    seen
}
