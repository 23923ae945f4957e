//! Catalog query engine.
//!
//! Resolves filters, sort order and page into one store query, fronted by
//! the composite-key list cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use tracing::{instrument, warn};

use crate::application::pagination::PageRequest;
use crate::application::repos::{CatalogRepo, ListingSearch, RepoError};
use crate::cache::{CatalogCaches, LISTINGS_PREFIX, composite_key};
use crate::domain::entities::Listing;
use crate::domain::filters::Filters;
use crate::domain::search::expand_search_term;
use crate::domain::types::SortBy;

pub use crate::application::pagination::Pagination;

pub(crate) const METRIC_QUERY_MS: &str = "pazar_catalog_query_ms";
pub(crate) const METRIC_QUERY_FAILED: &str = "pazar_catalog_query_failed_total";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub items: Vec<Listing>,
    pub pagination: Pagination,
}

/// A catalog query that could not be served. Distinct from an empty result.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog query failed: {0}")]
    Store(#[from] RepoError),
    #[error("catalog query timed out after {0:?}")]
    Timeout(Duration),
}

pub struct CatalogQueryEngine {
    repo: Arc<dyn CatalogRepo>,
    caches: Arc<CatalogCaches>,
    page_size: u32,
    query_timeout: Duration,
}

impl CatalogQueryEngine {
    pub fn new(
        repo: Arc<dyn CatalogRepo>,
        caches: Arc<CatalogCaches>,
        page_size: u32,
        query_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            caches,
            page_size: page_size.max(1),
            query_timeout,
        }
    }

    /// Serve one catalog page.
    ///
    /// The cache key is built from the original search term; only the store
    /// query sees the expanded alternates. Failed, timed-out and cancelled
    /// queries leave the cache untouched. No lock is held while the store
    /// query runs, so concurrent misses on one key may both reach the store.
    #[instrument(skip(self, filters), fields(sort = sort_by.as_str()))]
    pub async fn query(
        &self,
        page: u32,
        sort_by: SortBy,
        filters: &Filters,
    ) -> Result<CatalogPage, CatalogError> {
        let page = page.max(1);
        let key = composite_key(LISTINGS_PREFIX, page, sort_by.as_str(), filters);

        if let Some(cached) = self.caches.listings.get(&key) {
            return Ok(cached);
        }

        let search_terms = filters
            .search
            .as_deref()
            .map(expand_search_term)
            .unwrap_or_default();
        let request = ListingSearch {
            filters: filters.clone(),
            search_terms,
            sort: sort_by,
            page: PageRequest::new(page, self.page_size),
        };

        let epoch = self.caches.listings.epoch();
        let started_at = Instant::now();
        let outcome = tokio::time::timeout(self.query_timeout, self.repo.search_listings(&request))
            .await
            .map_err(|_| CatalogError::Timeout(self.query_timeout))
            .and_then(|result| result.map_err(CatalogError::from));
        histogram!(METRIC_QUERY_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        let slice = match outcome {
            Ok(slice) => slice,
            Err(err) => {
                counter!(METRIC_QUERY_FAILED).increment(1);
                warn!(
                    target = "pazar::catalog",
                    page,
                    cache_key = %key,
                    error = %err,
                    "Catalog query failed"
                );
                return Err(err);
            }
        };

        let result = CatalogPage {
            items: slice.items,
            pagination: Pagination::new(page, self.page_size, slice.total),
        };
        self.caches
            .listings
            .set_if_epoch(epoch, key, result.clone(), None);
        Ok(result)
    }
}
