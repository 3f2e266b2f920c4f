//! # Count Cache
//!
//! Counting rows is often the most expensive part of serving a table page, and
//! the exact figure rarely matters to the second. [`CountCache`] stores the
//! total row count and the row count per global search term for a limited
//! time. Nothing invalidates the entries early: counts may lag writes by up to
//! the configured TTL.
//!
//! [`SensibleCache`] implements it on top of any [`CacheStore`]; [`MokaStore`]
//! is the in-process store.
//!
//! A cached count of zero reads back as a miss. The store cannot tell a
//! computed zero apart from an absent entry, so empty tables are recounted on
//! every request.
//!
//! ```rust,ignore
//! let cache = SensibleCache::new(MokaStore::new(10_000), CacheConfig::default());
//! let provider = QueryBuilderProvider::new(builder).with_cache(Arc::new(cache));
//! ```

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};
use std::time::{Duration, Instant};

const TOTAL_ITEMS_KEY: &str = "total-items";
const SEARCH_KEY_PREFIX: &str = "search:";

/// Expiring key-value store the count cache writes through.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn has(&self, key: &str) -> bool;

    async fn get(&self, key: &str) -> Option<u64>;

    async fn put(&self, key: &str, value: u64, ttl: Duration);
}

/// Cached row counts. `None` is a miss; the caller counts and stores the result.
#[async_trait]
pub trait CountCache: Send + Sync {
    async fn get_total_items(&self) -> Option<u64>;

    async fn put_total_items(&self, items: u64);

    async fn get_total_items_with_search_value(&self, search_value: &str) -> Option<u64>;

    async fn put_total_items_with_search_value(&self, search_value: &str, items: u64);
}

/// Key namespace and entry lifetime of a [`SensibleCache`].
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prepended to every key as `<prefix>:<key>`
    pub key_prefix: String,
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "ttl_seconds")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: "datatable-cache".to_string(),
            ttl: Duration::from_secs(300),
        }
    }
}

/// [`CountCache`] over a [`CacheStore`], one key per count.
pub struct SensibleCache<S: CacheStore> {
    store: S,
    config: CacheConfig,
}

impl<S: CacheStore> SensibleCache<S> {
    #[must_use]
    pub fn new(store: S, config: CacheConfig) -> Self {
        Self { store, config }
    }

    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{key}", self.config.key_prefix)
    }

    async fn read(&self, key: &str) -> Option<u64> {
        let key = self.key(key);
        if !self.store.has(&key).await {
            tracing::debug!(key = %key, "count cache miss");
            return None;
        }

        let value = self.store.get(&key).await.filter(|count| *count != 0);
        tracing::debug!(key = %key, hit = value.is_some(), "count cache read");
        value
    }

    async fn write(&self, key: &str, items: u64) {
        let key = self.key(key);
        self.store.put(&key, items, self.config.ttl).await;
        tracing::debug!(key = %key, items, "count cache write");
    }
}

#[async_trait]
impl<S: CacheStore> CountCache for SensibleCache<S> {
    async fn get_total_items(&self) -> Option<u64> {
        self.read(TOTAL_ITEMS_KEY).await
    }

    async fn put_total_items(&self, items: u64) {
        self.write(TOTAL_ITEMS_KEY, items).await;
    }

    async fn get_total_items_with_search_value(&self, search_value: &str) -> Option<u64> {
        self.read(&format!("{SEARCH_KEY_PREFIX}{search_value}")).await
    }

    async fn put_total_items_with_search_value(&self, search_value: &str, items: u64) {
        self.write(&format!("{SEARCH_KEY_PREFIX}{search_value}"), items)
            .await;
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedCount {
    value: u64,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, CachedCount> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedCount,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedCount,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process [`CacheStore`] backed by Moka, honouring a TTL per entry.
///
/// Clones share the same underlying cache.
#[derive(Clone)]
pub struct MokaStore {
    cache: Cache<String, CachedCount>,
}

impl MokaStore {
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl CacheStore for MokaStore {
    async fn has(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    async fn get(&self, key: &str) -> Option<u64> {
        self.cache.get(key).await.map(|entry| entry.value)
    }

    async fn put(&self, key: &str, value: u64, ttl: Duration) {
        self.cache
            .insert(key.to_string(), CachedCount { value, ttl })
            .await;
    }
}
