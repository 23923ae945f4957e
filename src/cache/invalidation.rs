//! Write-path cache invalidation.
//!
//! Every mutating service calls into [`InvalidationCoordinator`] after the
//! store write succeeds and before it returns, so the caller's next read of
//! the entity it wrote never sees a pre-write snapshot.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::config::CacheConfig;
use super::keys::{
    BATCH_FAVORITES_PREFIX, LISTINGS_PREFIX, MESSAGES_PREFIX, listing_detail_full_key,
    listing_detail_key,
};
use super::store::CatalogCaches;

/// Evicts the cache entries a mutation may have staled.
///
/// Catalog query pages are not touched by single-listing writes unless
/// `invalidate_lists_on_write` is set; they go stale for at most one list TTL.
pub struct InvalidationCoordinator {
    caches: Arc<CatalogCaches>,
    invalidate_lists_on_write: bool,
}

impl InvalidationCoordinator {
    pub fn new(config: &CacheConfig, caches: Arc<CatalogCaches>) -> Self {
        Self {
            caches,
            invalidate_lists_on_write: config.invalidate_lists_on_write,
        }
    }

    pub fn caches(&self) -> &Arc<CatalogCaches> {
        &self.caches
    }

    /// A listing was created, updated or deleted.
    pub fn listing_changed(&self, listing_id: Uuid) {
        self.evict_listing_details(listing_id);

        let lists = if self.invalidate_lists_on_write {
            self.caches.listings.invalidate_by_prefix(LISTINGS_PREFIX)
        } else {
            0
        };

        debug!(
            target = "pazar::cache::invalidation",
            listing_id = %listing_id,
            lists,
            "Invalidated listing caches"
        );
    }

    /// A user favorited or unfavorited a listing.
    ///
    /// Any batch key containing this listing is stale, and batch keys cannot
    /// be addressed without re-deriving every id set, so all batch entries go.
    pub fn favorite_toggled(&self, user_id: Uuid, listing_id: Uuid) {
        self.evict_listing_details(listing_id);
        let batches = self
            .caches
            .batch_favorites
            .invalidate_by_prefix(BATCH_FAVORITES_PREFIX);

        debug!(
            target = "pazar::cache::invalidation",
            user_id = %user_id,
            listing_id = %listing_id,
            batches,
            "Invalidated favorite caches"
        );
    }

    /// A message was sent to, or read in, a conversation.
    pub fn conversation_changed(&self, conversation_id: Uuid) {
        let prefix = format!("{MESSAGES_PREFIX}_{conversation_id}_");
        let windows = self.caches.messages.invalidate_by_prefix(&prefix);

        debug!(
            target = "pazar::cache::invalidation",
            conversation_id = %conversation_id,
            windows,
            "Invalidated message windows"
        );
    }

    pub fn clear_all(&self) {
        self.caches.clear();
        debug!(target = "pazar::cache::invalidation", "Cleared all caches");
    }

    fn evict_listing_details(&self, listing_id: Uuid) {
        self.caches
            .listing_detail
            .invalidate(&listing_detail_key(listing_id));
        self.caches
            .listing_detail_full
            .invalidate(&listing_detail_full_key(listing_id));
    }
}
