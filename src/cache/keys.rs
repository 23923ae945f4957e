//! Cache key composition.
//!
//! Keys are plain strings so whole families can be dropped by prefix. Every
//! composer normalizes its inputs first: logically equal requests must land
//! on the same key regardless of how the caller ordered fields or ids.

use uuid::Uuid;

use crate::domain::filters::Filters;

pub const LISTING_DETAIL_PREFIX: &str = "listing_detail";
pub const LISTING_DETAIL_FULL_PREFIX: &str = "listing_detail_full";
pub const LISTINGS_PREFIX: &str = "listings";
pub const BATCH_FAVORITES_PREFIX: &str = "batch_favorites";
pub const MESSAGES_PREFIX: &str = "messages";

/// What a cache instance holds. Drives default TTLs and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CachePurpose {
    ListingDetail,
    ListingDetailFull,
    Listings,
    BatchFavorites,
    Messages,
}

impl CachePurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            CachePurpose::ListingDetail => "listing_detail",
            CachePurpose::ListingDetailFull => "listing_detail_full",
            CachePurpose::Listings => "listings",
            CachePurpose::BatchFavorites => "batch_favorites",
            CachePurpose::Messages => "messages",
        }
    }
}

/// `prefix_page_sortBy_filterString`, where the filter string is every
/// present filter as `name:value`, sorted by name and joined with `_`.
///
/// Values are escaped with [`escape_segment`] so free text containing the
/// separators cannot impersonate another filter set.
pub fn composite_key(prefix: &str, page: u32, sort_by: &str, filters: &Filters) -> String {
    let mut entries = filters.entries();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let filter_string = entries
        .iter()
        .map(|(name, value)| format!("{name}:{}", escape_segment(value)))
        .collect::<Vec<_>>()
        .join("_");
    format!("{prefix}_{page}_{sort_by}_{filter_string}")
}

/// Percent-encodes `%`, `_` and `:` so a value stays one key segment.
fn escape_segment(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '_' => escaped.push_str("%5F"),
            ':' => escaped.push_str("%3A"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// `prefix_userId_` followed by the item ids sorted and joined with `_`.
///
/// Duplicate ids collapse. The number of distinct keys grows with the
/// number of distinct id sets callers ask about.
pub fn batch_key<S: AsRef<str>>(prefix: &str, user_id: &str, items: &[S]) -> String {
    let mut sorted: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    sorted.dedup();
    format!("{prefix}_{user_id}_{}", sorted.join("_"))
}

/// `messages_scopeId_page_limit`.
pub fn scoped_list_key(scope_id: &str, page: u32, limit: u32) -> String {
    format!("{MESSAGES_PREFIX}_{scope_id}_{page}_{limit}")
}

pub fn listing_detail_key(id: Uuid) -> String {
    format!("{LISTING_DETAIL_PREFIX}_{id}")
}

pub fn listing_detail_full_key(id: Uuid) -> String {
    format!("{LISTING_DETAIL_FULL_PREFIX}_{id}")
}
