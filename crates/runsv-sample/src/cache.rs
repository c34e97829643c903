//! # Read-Through Cache Service
//!
//! [`CacheService`] depends on the [pool](crate::pool) and uses the **deferred**
//! convention (`async fn start` / `async fn stop`). On start it pulls the pool's
//! [`PooledClient`] out of its dependency clients; reads that miss locally go to the pool
//! and are remembered, writes go through to the pool.

use crate::pool::{PoolError, PooledClient, Statement, POOL};
use async_trait::async_trait;
use parking_lot::Mutex;
use runsv::framework::{Client, Clients, Service, ServiceResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Registered name of the cache service.
pub const CACHE: &str = "cache";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache requires the {0} service")]
    MissingDependency(&'static str),
    #[error("cache is already started")]
    AlreadyStarted,
    #[error("cache is not started")]
    NotStarted,
    #[error("cache is closed")]
    Closed,
    #[error(transparent)]
    Pool(#[from] PoolError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct Cache {
    backend: Arc<PooledClient>,
    entries: Mutex<HashMap<String, String>>,
    open: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Cache {
    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.lock().len(),
        }
    }
}

/// Client handed out by a started [`CacheService`].
#[derive(Clone)]
pub struct CacheClient {
    inner: Arc<Cache>,
}

impl CacheClient {
    /// Read `key`, falling back to the pool on a miss.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.ensure_open()?;
        let cached = self.inner.entries.lock().get(key).cloned();
        if let Some(value) = cached {
            self.inner.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(value));
        }

        self.inner.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key, "Cache miss");
        let value = self.inner.backend.query(Statement::get(key)).await?;
        if let Some(value) = &value {
            self.inner
                .entries
                .lock()
                .insert(key.to_string(), value.clone());
        }
        Ok(value)
    }

    /// Write `value` to the pool, then cache it.
    pub async fn put(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.ensure_open()?;
        self.inner.backend.query(Statement::put(key, value)).await?;
        self.inner
            .entries
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Forget the cached copy of `key`. The pool is untouched.
    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.entries.lock().remove(key).is_some()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.inner.open.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(CacheError::Closed)
        }
    }
}

/// The cache as a lifecycle-managed service.
#[derive(Default)]
pub struct CacheService {
    cache: Mutex<Option<Arc<Cache>>>,
}

impl CacheService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Service for CacheService {
    fn name(&self) -> &str {
        CACHE
    }

    async fn start(&self, dependencies: Option<Clients>) -> ServiceResult {
        let backend = dependencies
            .as_ref()
            .and_then(|clients| clients.get_as::<PooledClient>(POOL))
            .ok_or(CacheError::MissingDependency(POOL))?;

        let mut slot = self.cache.lock();
        if slot.is_some() {
            return Err(CacheError::AlreadyStarted.into());
        }
        *slot = Some(Arc::new(Cache {
            backend,
            entries: Mutex::new(HashMap::new()),
            open: AtomicBool::new(true),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }));
        info!("Cache ready");
        Ok(())
    }

    async fn stop(&self) -> ServiceResult {
        let cache = self.cache.lock().take().ok_or(CacheError::NotStarted)?;
        cache.open.store(false, Ordering::Release);
        let stats = cache.stats();
        cache.entries.lock().clear();
        info!(hits = stats.hits, misses = stats.misses, "Cache closed");
        Ok(())
    }

    fn client(&self) -> Option<Client> {
        let inner = self.cache.lock().clone()?;
        Some(Arc::new(CacheClient { inner }))
    }
}
