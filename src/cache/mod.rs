//! Pazar Cache System
//!
//! A single-process, in-memory performance layer in front of the catalog
//! store. Entries live in per-purpose [`TtlCache`] instances keyed by plain
//! strings produced by the key composer, expire lazily on read, and are
//! evicted synchronously by the [`InvalidationCoordinator`] on writes.
//!
//! ## Configuration
//!
//! Cache behavior is controlled via `pazar.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! list_ttl_ms = 120000
//! batch_ttl_ms = 30000
//! # ... see config.rs for all options
//! ```
//!
//! Nothing here survives a restart, and separate processes do not share or
//! invalidate each other's entries.

mod config;
mod invalidation;
mod keys;
mod lock;
pub(crate) mod store;

pub use config::CacheConfig;
pub use invalidation::InvalidationCoordinator;
pub use keys::{
    BATCH_FAVORITES_PREFIX, CachePurpose, LISTINGS_PREFIX, LISTING_DETAIL_FULL_PREFIX,
    LISTING_DETAIL_PREFIX, MESSAGES_PREFIX, batch_key, composite_key, listing_detail_full_key,
    listing_detail_key, scoped_list_key,
};
pub use store::{CatalogCaches, TtlCache};
