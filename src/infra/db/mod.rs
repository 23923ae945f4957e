//! Postgres-backed repository implementations.

mod catalog;
mod favorites;
mod listings;
mod messages;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    Postgres, QueryBuilder,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::{HealthRepo, RepoError};
use crate::domain::filters::Filters;

/// Columns selected for a plain listing row, aliased to `l`.
const LISTING_COLUMNS: &str = "l.id, l.title, l.description, l.price, l.condition, l.images, \
    l.location, l.category_id, l.material_id, l.seller_id, l.created_at, l.updated_at";

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    /// Append the `WHERE` predicates shared by the catalog page and count queries.
    fn apply_catalog_filters<'q>(
        qb: &mut QueryBuilder<'q, Postgres>,
        filters: &'q Filters,
        search_terms: &'q [String],
    ) {
        qb.push(" WHERE TRUE");

        if let Some(category) = filters.category {
            qb.push(" AND l.category_id = ");
            qb.push_bind(category);
        }

        if let Some(material) = filters.material {
            qb.push(" AND l.material_id = ");
            qb.push_bind(material);
        }

        if let Some(condition) = filters.condition {
            qb.push(" AND l.condition = ");
            qb.push_bind(condition);
        }

        if let Some(min) = filters.min_price {
            qb.push(" AND l.price >= ");
            qb.push_bind(min);
        }

        if let Some(max) = filters.max_price {
            qb.push(" AND l.price <= ");
            qb.push_bind(max);
        }

        if let Some(location) = filters.location.as_ref() {
            qb.push(" AND l.location ILIKE ");
            qb.push_bind(contains_pattern(location));
        }

        if !search_terms.is_empty() {
            let patterns: Vec<String> = search_terms
                .iter()
                .map(|term| contains_pattern(term))
                .collect();
            qb.push(" AND (l.title ILIKE ANY(");
            qb.push_bind(patterns.clone());
            qb.push(") OR l.description ILIKE ANY(");
            qb.push_bind(patterns);
            qb.push("))");
        }
    }

    fn convert_count(value: i64) -> Result<u64, RepoError> {
        value
            .try_into()
            .map_err(|_| RepoError::from_persistence("count exceeds supported range"))
    }
}

#[async_trait]
impl HealthRepo for PostgresRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}

/// `%term%` with LIKE metacharacters escaped.
fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
