//! Cache configuration.
//!
//! Per-purpose TTLs from `pazar.toml`. Data that changes often per unit of
//! time (favorites, message read state) gets the shortest TTLs.

use std::time::Duration;

use serde::Deserialize;

use super::keys::CachePurpose;

const DEFAULT_DETAIL_TTL_MS: u64 = 2 * 60 * 1000;
const DEFAULT_DETAIL_FULL_TTL_MS: u64 = 5 * 60 * 1000;
const DEFAULT_LIST_TTL_MS: u64 = 2 * 60 * 1000;
const DEFAULT_BATCH_TTL_MS: u64 = 30 * 1000;
const DEFAULT_MESSAGE_TTL_MS: u64 = 30 * 1000;

/// Cache configuration from `pazar.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the cache. When false every read is a miss and writes are dropped.
    pub enabled: bool,
    /// TTL for the plain listing detail view.
    pub detail_ttl_ms: u64,
    /// TTL for the relation-heavy listing detail view.
    pub detail_full_ttl_ms: u64,
    /// TTL for paginated catalog queries.
    pub list_ttl_ms: u64,
    /// TTL for batch favorite checks.
    pub batch_ttl_ms: u64,
    /// TTL for message windows.
    pub message_ttl_ms: u64,
    /// Also drop every catalog query page on single-listing writes.
    pub invalidate_lists_on_write: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            detail_ttl_ms: DEFAULT_DETAIL_TTL_MS,
            detail_full_ttl_ms: DEFAULT_DETAIL_FULL_TTL_MS,
            list_ttl_ms: DEFAULT_LIST_TTL_MS,
            batch_ttl_ms: DEFAULT_BATCH_TTL_MS,
            message_ttl_ms: DEFAULT_MESSAGE_TTL_MS,
            invalidate_lists_on_write: false,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            detail_ttl_ms: settings.detail_ttl_ms,
            detail_full_ttl_ms: settings.detail_full_ttl_ms,
            list_ttl_ms: settings.list_ttl_ms,
            batch_ttl_ms: settings.batch_ttl_ms,
            message_ttl_ms: settings.message_ttl_ms,
            invalidate_lists_on_write: settings.invalidate_lists_on_write,
        }
    }
}

impl CacheConfig {
    /// Default TTL for entries of the given purpose, never zero.
    pub fn ttl(&self, purpose: CachePurpose) -> Duration {
        let ms = match purpose {
            CachePurpose::ListingDetail => self.detail_ttl_ms,
            CachePurpose::ListingDetailFull => self.detail_full_ttl_ms,
            CachePurpose::Listings => self.list_ttl_ms,
            CachePurpose::BatchFavorites => self.batch_ttl_ms,
            CachePurpose::Messages => self.message_ttl_ms,
        };
        Duration::from_millis(ms.max(1))
    }
}
