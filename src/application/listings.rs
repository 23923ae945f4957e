use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{
    CreateListingParams, ListingsRepo, ListingsWriteRepo, RepoError, UpdateListingParams,
};
use crate::cache::{CatalogCaches, InvalidationCoordinator, listing_detail_full_key, listing_detail_key};
use crate::domain::entities::{Listing, ListingDetail};
use crate::domain::error::DomainError;
use crate::domain::types::{Actor, Condition};

const MAX_IMAGES: usize = 10;

const ENTITY: &str = "listing";

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl ListingError {
    fn not_found() -> Self {
        Self::Domain(DomainError::not_found(ENTITY))
    }
}

#[derive(Debug, Clone)]
pub struct CreateListingCommand {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub condition: Condition,
    pub images: Vec<String>,
    pub location: String,
    pub category_id: Option<Uuid>,
    pub material_id: Option<Uuid>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdateListingCommand {
    pub id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub condition: Option<Condition>,
    pub images: Option<Vec<String>>,
    pub location: Option<String>,
    pub category_id: Option<Option<Uuid>>,
    pub material_id: Option<Option<Uuid>>,
}

#[derive(Clone)]
pub struct ListingService {
    reader: Arc<dyn ListingsRepo>,
    writer: Arc<dyn ListingsWriteRepo>,
    caches: Arc<CatalogCaches>,
    invalidation: Arc<InvalidationCoordinator>,
}

impl ListingService {
    pub fn new(
        reader: Arc<dyn ListingsRepo>,
        writer: Arc<dyn ListingsWriteRepo>,
        invalidation: Arc<InvalidationCoordinator>,
    ) -> Self {
        Self {
            reader,
            writer,
            caches: invalidation.caches().clone(),
            invalidation,
        }
    }

    pub async fn detail(&self, id: Uuid) -> Result<Listing, ListingError> {
        let key = listing_detail_key(id);
        if let Some(listing) = self.caches.listing_detail.get(&key) {
            return Ok(listing);
        }

        let epoch = self.caches.listing_detail.epoch();
        let listing = self.reader.find_by_id(id).await?.ok_or_else(ListingError::not_found)?;
        self.caches
            .listing_detail
            .set_if_epoch(epoch, key, listing.clone(), None);
        Ok(listing)
    }

    pub async fn detail_full(&self, id: Uuid) -> Result<ListingDetail, ListingError> {
        let key = listing_detail_full_key(id);
        if let Some(detail) = self.caches.listing_detail_full.get(&key) {
            return Ok(detail);
        }

        let epoch = self.caches.listing_detail_full.epoch();
        let detail = self
            .reader
            .find_detail(id)
            .await?
            .ok_or_else(ListingError::not_found)?;
        self.caches
            .listing_detail_full
            .set_if_epoch(epoch, key, detail.clone(), None);
        Ok(detail)
    }

    pub async fn create(
        &self,
        actor: &Actor,
        command: CreateListingCommand,
    ) -> Result<Listing, ListingError> {
        let CreateListingCommand {
            title,
            description,
            price,
            condition,
            images,
            location,
            category_id,
            material_id,
        } = command;

        let params = CreateListingParams {
            title: required_text(title, "title must not be empty")?,
            description: description.trim().to_string(),
            price: validate_price(price)?,
            condition,
            images: validate_images(images)?,
            location: required_text(location, "location must not be empty")?,
            category_id,
            material_id,
            seller_id: actor.user_id,
        };

        let listing = self.writer.create_listing(params).await?;
        self.invalidation.listing_changed(listing.id);

        info!(
            target = "pazar::listings",
            listing_id = %listing.id,
            seller_id = %listing.seller_id,
            "Listing created"
        );
        Ok(listing)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        command: UpdateListingCommand,
    ) -> Result<Listing, ListingError> {
        let current = self.owned_listing(actor, command.id).await?;

        let params = UpdateListingParams {
            id: current.id,
            title: match command.title {
                Some(title) => required_text(title, "title must not be empty")?,
                None => current.title,
            },
            description: command
                .description
                .map(|value| value.trim().to_string())
                .unwrap_or(current.description),
            price: match command.price {
                Some(price) => validate_price(price)?,
                None => current.price,
            },
            condition: command.condition.unwrap_or(current.condition),
            images: match command.images {
                Some(images) => validate_images(images)?,
                None => current.images,
            },
            location: match command.location {
                Some(location) => required_text(location, "location must not be empty")?,
                None => current.location,
            },
            category_id: command.category_id.unwrap_or(current.category_id),
            material_id: command.material_id.unwrap_or(current.material_id),
        };

        let listing = self.writer.update_listing(params).await.map_err(not_found)?;
        self.invalidation.listing_changed(listing.id);

        info!(
            target = "pazar::listings",
            listing_id = %listing.id,
            actor = %actor.user_id,
            "Listing updated"
        );
        Ok(listing)
    }

    pub async fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ListingError> {
        self.owned_listing(actor, id).await?;

        self.writer.delete_listing(id).await.map_err(not_found)?;
        self.invalidation.listing_changed(id);

        info!(
            target = "pazar::listings",
            listing_id = %id,
            actor = %actor.user_id,
            admin = actor.is_admin(),
            "Listing deleted"
        );
        Ok(())
    }

    /// Load the stored listing, bypassing the cache, and check the actor may modify it.
    async fn owned_listing(&self, actor: &Actor, id: Uuid) -> Result<Listing, ListingError> {
        let listing = self.reader.find_by_id(id).await?.ok_or_else(ListingError::not_found)?;
        if listing.seller_id != actor.user_id && !actor.is_admin() {
            return Err(DomainError::forbidden(ENTITY).into());
        }
        Ok(listing)
    }
}

fn not_found(err: RepoError) -> ListingError {
    match err {
        RepoError::NotFound => ListingError::not_found(),
        other => ListingError::Repo(other),
    }
}

fn required_text(value: String, message: &'static str) -> Result<String, ListingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(message).into());
    }
    Ok(trimmed.to_string())
}

fn validate_price(price: Decimal) -> Result<Decimal, ListingError> {
    if price.is_sign_negative() {
        return Err(DomainError::validation("price must not be negative").into());
    }
    Ok(price)
}

fn validate_images(images: Vec<String>) -> Result<Vec<String>, ListingError> {
    let images: Vec<String> = images
        .into_iter()
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .collect();
    if images.len() > MAX_IMAGES {
        return Err(DomainError::validation(format!("at most {MAX_IMAGES} images")).into());
    }
    Ok(images)
}
