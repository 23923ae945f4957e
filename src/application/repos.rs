//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::entities::{Category, Listing, ListingDetail, MaterialType, Message};
use crate::domain::filters::Filters;
use crate::domain::types::{Condition, SortBy};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// A fully resolved catalog search handed to the store.
///
/// `search_terms` holds the expanded alternates of `filters.search`; a
/// listing matches when any alternate occurs in its title or description.
#[derive(Debug, Clone)]
pub struct ListingSearch {
    pub filters: Filters,
    pub search_terms: Vec<String>,
    pub sort: SortBy,
    pub page: PageRequest,
}

/// One page of matching listings plus the total match count.
#[derive(Debug, Clone, Default)]
pub struct ListingSlice {
    pub items: Vec<Listing>,
    pub total: u64,
}

#[derive(Debug, Clone)]
pub struct CreateListingParams {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub condition: Condition,
    pub images: Vec<String>,
    pub location: String,
    pub category_id: Option<Uuid>,
    pub material_id: Option<Uuid>,
    pub seller_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdateListingParams {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub condition: Condition,
    pub images: Vec<String>,
    pub location: String,
    pub category_id: Option<Uuid>,
    pub material_id: Option<Uuid>,
}

#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn search_listings(&self, search: &ListingSearch) -> Result<ListingSlice, RepoError>;

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError>;

    /// Materials ordered by name. With `Some(category)`, only materials
    /// scoped to that category or unscoped ones.
    async fn list_material_types(
        &self,
        category_id: Option<Uuid>,
    ) -> Result<Vec<MaterialType>, RepoError>;
}

#[async_trait]
pub trait ListingsRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>, RepoError>;

    async fn find_detail(&self, id: Uuid) -> Result<Option<ListingDetail>, RepoError>;
}

#[async_trait]
pub trait ListingsWriteRepo: Send + Sync {
    async fn create_listing(&self, params: CreateListingParams) -> Result<Listing, RepoError>;

    async fn update_listing(&self, params: UpdateListingParams) -> Result<Listing, RepoError>;

    async fn delete_listing(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait FavoritesRepo: Send + Sync {
    /// Flip the favorite flag; returns whether the listing is now a favorite.
    async fn toggle_favorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool, RepoError>;

    /// The subset of `listing_ids` the user has favorited.
    async fn favorited_among(
        &self,
        user_id: Uuid,
        listing_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepoError>;
}

#[async_trait]
pub trait MessagesRepo: Send + Sync {
    /// Messages of a conversation, newest first.
    async fn list_messages(
        &self,
        conversation_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Message>, RepoError>;

    async fn insert_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<Message, RepoError>;

    /// Mark every message not sent by `reader_id` as read; returns rows touched.
    async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
