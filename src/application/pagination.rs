//! Offset pagination helpers.

use serde::Serialize;

/// Catalog page size.
pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// Parse a 1-indexed page number. Missing, malformed, zero and negative
/// values all become page 1.
pub fn normalize_page(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|page| *page >= 1)
        .map(|page| u32::try_from(page).unwrap_or(u32::MAX))
        .unwrap_or(1)
}

/// A page of `page_size` items starting at `page` (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_items: u64,
    pub has_next_page: bool,
}

impl Pagination {
    pub fn new(current_page: u32, page_size: u32, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(u64::from(page_size.max(1)));
        Self {
            current_page,
            total_pages,
            total_items,
            has_next_page: u64::from(current_page) < total_pages,
        }
    }

    /// Zero-result pagination used when a query could not be served.
    pub fn empty(current_page: u32) -> Self {
        Self::new(current_page, DEFAULT_PAGE_SIZE, 0)
    }
}
