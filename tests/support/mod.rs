#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tokio::sync::{Mutex, Notify};
use uuid::Uuid;

use pazar::application::repos::{
    CatalogRepo, CreateListingParams, FavoritesRepo, HealthRepo, ListingSearch, ListingSlice,
    ListingsRepo, ListingsWriteRepo, MessagesRepo, RepoError, UpdateListingParams,
};
use pazar::domain::entities::{Category, Listing, ListingDetail, MaterialType, Message};
use pazar::domain::types::{Condition, SortBy};

/// In-memory store standing in for Postgres. Counts calls per operation.
#[derive(Default)]
pub struct MemoryMarketplace {
    pub listings: Mutex<Vec<Listing>>,
    pub categories: Mutex<Vec<Category>>,
    pub materials: Mutex<Vec<MaterialType>>,
    pub favorites: Mutex<HashSet<(Uuid, Uuid)>>,
    pub messages: Mutex<HashMap<Uuid, Vec<Message>>>,
    pub search_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub favorite_checks: AtomicUsize,
    pub fail_searches: AtomicBool,
    pub unhealthy: AtomicBool,
    /// Parks the next `find_by_id` after it has read its row.
    pub detail_gate: std::sync::Mutex<Option<Arc<ReadGate>>>,
}

#[derive(Default)]
pub struct ReadGate {
    pub entered: Notify,
    pub release: Notify,
}

impl MemoryMarketplace {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn seed_listing(&self, listing: Listing) {
        self.listings.lock().await.push(listing);
    }

    pub async fn seed_category(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.categories.lock().await.push(Category {
            id,
            name: name.to_string(),
            description: None,
        });
        id
    }

    pub async fn seed_material(&self, name: &str, category_id: Option<Uuid>) -> Uuid {
        let id = Uuid::new_v4();
        self.materials.lock().await.push(MaterialType {
            id,
            name: name.to_string(),
            description: None,
            category_id,
        });
        id
    }

    pub fn hold_next_detail(&self) -> Arc<ReadGate> {
        let gate = Arc::new(ReadGate::default());
        *self.detail_gate.lock().expect("gate lock") = Some(gate.clone());
        gate
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn details(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn favorite_lookups(&self) -> usize {
        self.favorite_checks.load(Ordering::SeqCst)
    }
}

pub fn sample_listing(title: &str, price: i64, seller_id: Uuid) -> Listing {
    let now = OffsetDateTime::now_utc();
    Listing {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: String::new(),
        price: Decimal::from(price),
        condition: Condition::Used,
        images: Vec::new(),
        location: "İzmir".to_string(),
        category_id: None,
        material_id: None,
        seller_id,
        created_at: now,
        updated_at: now,
    }
}

/// `count` listings with strictly increasing creation times.
pub fn numbered_listings(count: usize, seller_id: Uuid) -> Vec<Listing> {
    let base = OffsetDateTime::now_utc() - time::Duration::hours(count as i64);
    (0..count)
        .map(|index| {
            let mut listing = sample_listing(&format!("Listing {index}"), 100 + index as i64, seller_id);
            listing.created_at = base + time::Duration::minutes(index as i64);
            listing.updated_at = listing.created_at;
            listing
        })
        .collect()
}

fn matches(listing: &Listing, search: &ListingSearch) -> bool {
    let filters = &search.filters;
    if filters.category.is_some() && listing.category_id != filters.category {
        return false;
    }
    if filters.material.is_some() && listing.material_id != filters.material {
        return false;
    }
    if filters.condition.is_some_and(|condition| condition != listing.condition) {
        return false;
    }
    if filters.min_price.is_some_and(|min| listing.price < min) {
        return false;
    }
    if filters.max_price.is_some_and(|max| listing.price > max) {
        return false;
    }
    if let Some(location) = filters.location.as_deref() {
        if !listing.location.to_lowercase().contains(&location.to_lowercase()) {
            return false;
        }
    }
    if !search.search_terms.is_empty() {
        let haystack = format!("{} {}", listing.title, listing.description).to_lowercase();
        if !search
            .search_terms
            .iter()
            .any(|term| haystack.contains(&term.to_lowercase()))
        {
            return false;
        }
    }
    true
}

#[async_trait]
impl CatalogRepo for MemoryMarketplace {
    async fn search_listings(&self, search: &ListingSearch) -> Result<ListingSlice, RepoError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_searches.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("connection reset"));
        }

        let mut matched: Vec<Listing> = self
            .listings
            .lock()
            .await
            .iter()
            .filter(|listing| matches(listing, search))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let primary = match search.sort {
                SortBy::Newest => b.created_at.cmp(&a.created_at),
                SortBy::Oldest => a.created_at.cmp(&b.created_at),
                SortBy::PriceAsc => a.price.cmp(&b.price),
                SortBy::PriceDesc => b.price.cmp(&a.price),
            };
            primary.then(a.id.cmp(&b.id))
        });

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(search.page.offset() as usize)
            .take(search.page.limit() as usize)
            .collect();
        Ok(ListingSlice { items, total })
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepoError> {
        let mut categories = self.categories.lock().await.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_material_types(
        &self,
        category_id: Option<Uuid>,
    ) -> Result<Vec<MaterialType>, RepoError> {
        let mut materials: Vec<MaterialType> = self
            .materials
            .lock()
            .await
            .iter()
            .filter(|material| match category_id {
                Some(category) => material.category_id.is_none_or(|scope| scope == category),
                None => true,
            })
            .cloned()
            .collect();
        materials.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(materials)
    }
}

#[async_trait]
impl ListingsRepo for MemoryMarketplace {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>, RepoError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let snapshot = self
            .listings
            .lock()
            .await
            .iter()
            .find(|listing| listing.id == id)
            .cloned();

        let gate = self.detail_gate.lock().expect("gate lock").take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        Ok(snapshot)
    }

    async fn find_detail(&self, id: Uuid) -> Result<Option<ListingDetail>, RepoError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let Some(listing) = self
            .listings
            .lock()
            .await
            .iter()
            .find(|listing| listing.id == id)
            .cloned()
        else {
            return Ok(None);
        };

        let category = match listing.category_id {
            Some(category_id) => self
                .categories
                .lock()
                .await
                .iter()
                .find(|category| category.id == category_id)
                .cloned(),
            None => None,
        };
        let material = match listing.material_id {
            Some(material_id) => self
                .materials
                .lock()
                .await
                .iter()
                .find(|material| material.id == material_id)
                .cloned(),
            None => None,
        };
        let favorite_count = self
            .favorites
            .lock()
            .await
            .iter()
            .filter(|(_, listing_id)| *listing_id == id)
            .count() as u64;

        Ok(Some(ListingDetail {
            listing,
            category,
            material,
            favorite_count,
        }))
    }
}

#[async_trait]
impl ListingsWriteRepo for MemoryMarketplace {
    async fn create_listing(&self, params: CreateListingParams) -> Result<Listing, RepoError> {
        let now = OffsetDateTime::now_utc();
        let listing = Listing {
            id: Uuid::new_v4(),
            title: params.title,
            description: params.description,
            price: params.price,
            condition: params.condition,
            images: params.images,
            location: params.location,
            category_id: params.category_id,
            material_id: params.material_id,
            seller_id: params.seller_id,
            created_at: now,
            updated_at: now,
        };
        self.listings.lock().await.push(listing.clone());
        Ok(listing)
    }

    async fn update_listing(&self, params: UpdateListingParams) -> Result<Listing, RepoError> {
        let mut listings = self.listings.lock().await;
        let listing = listings
            .iter_mut()
            .find(|listing| listing.id == params.id)
            .ok_or(RepoError::NotFound)?;

        listing.title = params.title;
        listing.description = params.description;
        listing.price = params.price;
        listing.condition = params.condition;
        listing.images = params.images;
        listing.location = params.location;
        listing.category_id = params.category_id;
        listing.material_id = params.material_id;
        listing.updated_at = OffsetDateTime::now_utc();
        Ok(listing.clone())
    }

    async fn delete_listing(&self, id: Uuid) -> Result<(), RepoError> {
        let mut listings = self.listings.lock().await;
        let before = listings.len();
        listings.retain(|listing| listing.id != id);
        if listings.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl FavoritesRepo for MemoryMarketplace {
    async fn toggle_favorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool, RepoError> {
        let exists = self
            .listings
            .lock()
            .await
            .iter()
            .any(|listing| listing.id == listing_id);
        if !exists {
            return Err(RepoError::NotFound);
        }

        let mut favorites = self.favorites.lock().await;
        if favorites.remove(&(user_id, listing_id)) {
            Ok(false)
        } else {
            favorites.insert((user_id, listing_id));
            Ok(true)
        }
    }

    async fn favorited_among(
        &self,
        user_id: Uuid,
        listing_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepoError> {
        self.favorite_checks.fetch_add(1, Ordering::SeqCst);
        let favorites = self.favorites.lock().await;
        Ok(listing_ids
            .iter()
            .copied()
            .filter(|id| favorites.contains(&(user_id, *id)))
            .collect())
    }
}

#[async_trait]
impl MessagesRepo for MemoryMarketplace {
    async fn list_messages(
        &self,
        conversation_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Message>, RepoError> {
        let messages = self.messages.lock().await;
        let mut thread = messages.get(&conversation_id).cloned().unwrap_or_default();
        thread.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(thread
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn insert_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        body: &str,
    ) -> Result<Message, RepoError> {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            body: body.to_string(),
            read: false,
            created_at: OffsetDateTime::now_utc(),
        };
        self.messages
            .lock()
            .await
            .entry(conversation_id)
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn mark_read(&self, conversation_id: Uuid, reader_id: Uuid) -> Result<u64, RepoError> {
        let mut messages = self.messages.lock().await;
        let mut updated = 0;
        if let Some(thread) = messages.get_mut(&conversation_id) {
            for message in thread
                .iter_mut()
                .filter(|message| message.sender_id != reader_id && !message.read)
            {
                message.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl HealthRepo for MemoryMarketplace {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(())
    }
}

pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);
