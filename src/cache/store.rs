//! Cache storage.
//!
//! [`TtlCache`] is a mutex-guarded string-keyed map with lazy expiry.
//! [`CatalogCaches`] groups one typed instance per cache purpose.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::counter;
use tokio::time::Instant;
use uuid::Uuid;

use crate::application::catalog::CatalogPage;
use crate::application::messages::MessagePage;
use crate::domain::entities::{Listing, ListingDetail};

use super::config::CacheConfig;
use super::keys::CachePurpose;
use super::lock::mutex_lock;

pub(crate) const METRIC_CACHE_HIT: &str = "pazar_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "pazar_cache_miss_total";
pub(crate) const METRIC_CACHE_EXPIRED: &str = "pazar_cache_expired_total";
pub(crate) const METRIC_CACHE_INVALIDATED: &str = "pazar_cache_invalidated_total";

struct CacheEntry<V> {
    data: V,
    created_at: Instant,
    ttl: Option<Duration>,
}

/// String-keyed cache with per-entry or default expiry.
///
/// There is no background sweeper. An expired entry is removed when it is
/// read, when a prefix invalidation scans it, or on [`TtlCache::clear`];
/// entries that are never touched again keep their memory until then.
///
/// Every invalidation advances an epoch. A reader that missed takes
/// [`TtlCache::epoch`] before going to the store and stores its result with
/// [`TtlCache::set_if_epoch`], which refuses the write when an invalidation
/// landed in between.
pub struct TtlCache<V> {
    purpose: CachePurpose,
    default_ttl: Duration,
    enabled: bool,
    epoch: AtomicU64,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(purpose: CachePurpose, default_ttl: Duration) -> Self {
        Self {
            purpose,
            default_ttl,
            enabled: true,
            epoch: AtomicU64::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled(purpose: CachePurpose) -> Self {
        Self {
            enabled: false,
            ..Self::new(purpose, Duration::ZERO)
        }
    }

    pub fn purpose(&self) -> CachePurpose {
        self.purpose
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Return the value when its age is within its TTL; otherwise drop it.
    ///
    /// The expiry check and the removal happen under one lock acquisition,
    /// so a concurrent `set` of the same key cannot be deleted by a stale read.
    pub fn get(&self, key: &str) -> Option<V> {
        let label = self.purpose.as_str();
        let mut entries = mutex_lock(&self.entries, label, "get");

        let fresh = match entries.get(key) {
            Some(entry) => {
                let ttl = entry.ttl.unwrap_or(self.default_ttl);
                Instant::now().duration_since(entry.created_at) <= ttl
            }
            None => {
                counter!(METRIC_CACHE_MISS, "purpose" => label).increment(1);
                return None;
            }
        };

        if fresh {
            counter!(METRIC_CACHE_HIT, "purpose" => label).increment(1);
            entries.get(key).map(|entry| entry.data.clone())
        } else {
            entries.remove(key);
            counter!(METRIC_CACHE_EXPIRED, "purpose" => label).increment(1);
            counter!(METRIC_CACHE_MISS, "purpose" => label).increment(1);
            None
        }
    }

    /// Store `value`, stamped now, with `ttl` or the cache default.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        if !self.enabled {
            return;
        }
        let entry = CacheEntry {
            data: value,
            created_at: Instant::now(),
            ttl,
        };
        mutex_lock(&self.entries, self.purpose.as_str(), "set").insert(key.into(), entry);
    }

    /// Current invalidation epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Like [`TtlCache::set`], but only while no invalidation has happened
    /// since `epoch` was read. Returns whether the value was stored.
    pub fn set_if_epoch(
        &self,
        epoch: u64,
        key: impl Into<String>,
        value: V,
        ttl: Option<Duration>,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let mut entries = mutex_lock(&self.entries, self.purpose.as_str(), "set_if_epoch");
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        entries.insert(
            key.into(),
            CacheEntry {
                data: value,
                created_at: Instant::now(),
                ttl,
            },
        );
        true
    }

    /// Remove one entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = {
            let mut entries = mutex_lock(&self.entries, self.purpose.as_str(), "invalidate");
            self.epoch.fetch_add(1, Ordering::SeqCst);
            entries.remove(key).is_some()
        };
        if removed {
            counter!(METRIC_CACHE_INVALIDATED, "purpose" => self.purpose.as_str()).increment(1);
        }
        removed
    }

    /// Remove every key starting with `prefix`. Returns the number removed.
    ///
    /// This is a linear scan over all keys: O(n) in the cache size.
    pub fn invalidate_by_prefix(&self, prefix: &str) -> usize {
        let mut entries = mutex_lock(&self.entries, self.purpose.as_str(), "invalidate_by_prefix");
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            counter!(METRIC_CACHE_INVALIDATED, "purpose" => self.purpose.as_str())
                .increment(removed as u64);
        }
        removed
    }

    pub fn clear(&self) {
        let mut entries = mutex_lock(&self.entries, self.purpose.as_str(), "clear");
        self.epoch.fetch_add(1, Ordering::SeqCst);
        entries.clear();
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, self.purpose.as_str(), "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        mutex_lock(&self.entries, self.purpose.as_str(), "contains_key").contains_key(key)
    }
}

/// One typed cache per purpose, owned by the composition root.
pub struct CatalogCaches {
    pub listing_detail: TtlCache<Listing>,
    pub listing_detail_full: TtlCache<ListingDetail>,
    pub listings: TtlCache<CatalogPage>,
    pub batch_favorites: TtlCache<Vec<Uuid>>,
    pub messages: TtlCache<MessagePage>,
}

impl CatalogCaches {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            listing_detail: build(config, CachePurpose::ListingDetail),
            listing_detail_full: build(config, CachePurpose::ListingDetailFull),
            listings: build(config, CachePurpose::Listings),
            batch_favorites: build(config, CachePurpose::BatchFavorites),
            messages: build(config, CachePurpose::Messages),
        }
    }

    /// Clear all cached data.
    pub fn clear(&self) {
        self.listing_detail.clear();
        self.listing_detail_full.clear();
        self.listings.clear();
        self.batch_favorites.clear();
        self.messages.clear();
    }
}

fn build<V: Clone>(config: &CacheConfig, purpose: CachePurpose) -> TtlCache<V> {
    if config.enabled {
        TtlCache::new(purpose, config.ttl(purpose))
    } else {
        TtlCache::disabled(purpose)
    }
}
