use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::pagination::Pagination;
use crate::domain::entities::{Category, Listing, MaterialType};
use crate::domain::filters::RawFilters;
use crate::domain::types::Condition;

/// Successful response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub page: Option<String>,
    pub sort_by: Option<String>,
    #[serde(flatten)]
    pub filters: RawFilters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogData {
    pub items: Vec<Listing>,
    pub categories: Vec<Category>,
    pub material_types: Vec<MaterialType>,
    pub pagination: Pagination,
}

/// Catalog failure body: the error flag plus an empty result of the usual shape.
#[derive(Debug, Serialize)]
pub struct CatalogFailure {
    pub success: bool,
    pub message: &'static str,
    pub data: CatalogData,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MaterialTypesQuery {
    pub category_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FavoritesCheckQuery {
    pub ids: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggleData {
    pub listing_id: Uuid,
    pub favorited: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesCheckData {
    pub favorited_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MessagesQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageSendRequest {
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct MarkReadData {
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct CacheClearData {
    pub cleared: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingCreateRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub condition: Condition,
    #[serde(default)]
    pub images: Vec<String>,
    pub location: String,
    pub category_id: Option<Uuid>,
    pub material_id: Option<Uuid>,
}

/// Partial listing update. `categoryId: null` clears the category, while an
/// absent key leaves it unchanged.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListingUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub condition: Option<Condition>,
    pub images: Option<Vec<String>>,
    pub location: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "present")]
    pub material_id: Option<Option<Uuid>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}
