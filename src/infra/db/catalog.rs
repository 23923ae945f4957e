use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    application::repos::{CatalogRepo, ListingSearch, ListingSlice, RepoError},
    domain::entities::{Category, MaterialType},
    domain::types::SortBy,
};

use super::listings::ListingRow;
use super::{LISTING_COLUMNS, PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MaterialTypeRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    category_id: Option<Uuid>,
}

impl From<MaterialTypeRow> for MaterialType {
    fn from(row: MaterialTypeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            category_id: row.category_id,
        }
    }
}

fn order_clause(sort: SortBy) -> &'static str {
    match sort {
        SortBy::Newest => " ORDER BY l.created_at DESC, l.id ASC",
        SortBy::Oldest => " ORDER BY l.created_at ASC, l.id ASC",
        SortBy::PriceAsc => " ORDER BY l.price ASC, l.id ASC",
        SortBy::PriceDesc => " ORDER BY l.price DESC, l.id ASC",
    }
}

#[async_trait]
impl CatalogRepo for PostgresRepositories {
    async fn search_listings(&self, search: &ListingSearch) -> Result<ListingSlice, RepoError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM listings l");
        Self::apply_catalog_filters(&mut count_qb, &search.filters, &search.search_terms);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        let total = Self::convert_count(total)?;

        if total <= search.page.offset() {
            return Ok(ListingSlice {
                items: Vec::new(),
                total,
            });
        }

        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(LISTING_COLUMNS);
        qb.push(" FROM listings l");
        Self::apply_catalog_filters(&mut qb, &search.filters, &search.search_terms);
        qb.push(order_clause(search.sort));
        qb.push(" LIMIT ");
        qb.push_bind(i64::try_from(search.page.limit()).unwrap_or(i64::MAX));
        qb.push(" OFFSET ");
        qb.push_bind(i64::try_from(search.page.offset()).unwrap_or(i64::MAX));

        let rows: Vec<ListingRow> = qb
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(ListingSlice {
            items: rows.into_iter().map(Into::into).collect(),
            total,
        })
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, description
            FROM categories
            ORDER BY name ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn list_material_types(
        &self,
        category_id: Option<Uuid>,
    ) -> Result<Vec<MaterialType>, RepoError> {
        let rows = sqlx::query_as::<_, MaterialTypeRow>(
            r#"
            SELECT id, name, description, category_id
            FROM material_types
            WHERE $1::uuid IS NULL OR category_id = $1 OR category_id IS NULL
            ORDER BY name ASC
            "#,
        )
        .bind(category_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MaterialType::from).collect())
    }
}
