use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{
        CreateListingParams, ListingsRepo, ListingsWriteRepo, RepoError, UpdateListingParams,
    },
    domain::entities::{Category, Listing, ListingDetail, MaterialType},
    domain::types::Condition,
};

use super::{LISTING_COLUMNS, PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
pub(super) struct ListingRow {
    id: Uuid,
    title: String,
    description: String,
    price: Decimal,
    condition: Condition,
    images: Vec<String>,
    location: String,
    category_id: Option<Uuid>,
    material_id: Option<Uuid>,
    seller_id: Uuid,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            condition: row.condition,
            images: row.images,
            location: row.location,
            category_id: row.category_id,
            material_id: row.material_id,
            seller_id: row.seller_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ListingDetailRow {
    #[sqlx(flatten)]
    listing: ListingRow,
    category_name: Option<String>,
    category_description: Option<String>,
    material_name: Option<String>,
    material_description: Option<String>,
    material_category_id: Option<Uuid>,
    favorite_count: i64,
}

impl ListingDetailRow {
    fn into_detail(self) -> Result<ListingDetail, RepoError> {
        let listing = Listing::from(self.listing);

        let category = match (listing.category_id, self.category_name) {
            (Some(id), Some(name)) => Some(Category {
                id,
                name,
                description: self.category_description,
            }),
            _ => None,
        };
        let material = match (listing.material_id, self.material_name) {
            (Some(id), Some(name)) => Some(MaterialType {
                id,
                name,
                description: self.material_description,
                category_id: self.material_category_id,
            }),
            _ => None,
        };
        let favorite_count = PostgresRepositories::convert_count(self.favorite_count)?;

        Ok(ListingDetail {
            listing,
            category,
            material,
            favorite_count,
        })
    }
}

#[async_trait]
impl ListingsRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>, RepoError> {
        let sql = format!("SELECT {LISTING_COLUMNS} FROM listings l WHERE l.id = $1");
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(Listing::from))
    }

    async fn find_detail(&self, id: Uuid) -> Result<Option<ListingDetail>, RepoError> {
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS},
                   c.name AS category_name,
                   c.description AS category_description,
                   m.name AS material_name,
                   m.description AS material_description,
                   m.category_id AS material_category_id,
                   (SELECT COUNT(*) FROM favorites f WHERE f.listing_id = l.id) AS favorite_count
            FROM listings l
            LEFT JOIN categories c ON c.id = l.category_id
            LEFT JOIN material_types m ON m.id = l.material_id
            WHERE l.id = $1
            "#
        );
        let row = sqlx::query_as::<_, ListingDetailRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(ListingDetailRow::into_detail).transpose()
    }
}

#[async_trait]
impl ListingsWriteRepo for PostgresRepositories {
    async fn create_listing(&self, params: CreateListingParams) -> Result<Listing, RepoError> {
        let sql = format!(
            r#"
            INSERT INTO listings AS l (
                title, description, price, condition, images, location,
                category_id, material_id, seller_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {LISTING_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(params.title)
            .bind(params.description)
            .bind(params.price)
            .bind(params.condition)
            .bind(params.images)
            .bind(params.location)
            .bind(params.category_id)
            .bind(params.material_id)
            .bind(params.seller_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_listing(&self, params: UpdateListingParams) -> Result<Listing, RepoError> {
        let sql = format!(
            r#"
            UPDATE listings AS l
            SET title = $2,
                description = $3,
                price = $4,
                condition = $5,
                images = $6,
                location = $7,
                category_id = $8,
                material_id = $9,
                updated_at = now()
            WHERE l.id = $1
            RETURNING {LISTING_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(params.id)
            .bind(params.title)
            .bind(params.description)
            .bind(params.price)
            .bind(params.condition)
            .bind(params.images)
            .bind(params.location)
            .bind(params.category_id)
            .bind(params.material_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(Listing::from).ok_or(RepoError::NotFound)
    }

    async fn delete_listing(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
