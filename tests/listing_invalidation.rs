mod support;

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use pazar::application::favorites::FavoriteService;
use pazar::application::listings::{ListingError, ListingService, UpdateListingCommand};
use pazar::application::messages::MessageService;
use pazar::cache::{CacheConfig, CatalogCaches, InvalidationCoordinator};
use pazar::domain::error::DomainError;
use pazar::domain::types::Actor;

use support::{MemoryMarketplace, sample_listing};

struct Services {
    listings: ListingService,
    favorites: FavoriteService,
    messages: MessageService,
}

fn services(store: &Arc<MemoryMarketplace>) -> Services {
    let config = CacheConfig::default();
    let caches = Arc::new(CatalogCaches::new(&config));
    let invalidation = Arc::new(InvalidationCoordinator::new(&config, caches));

    Services {
        listings: ListingService::new(store.clone(), store.clone(), invalidation.clone()),
        favorites: FavoriteService::new(store.clone(), invalidation.clone()),
        messages: MessageService::new(store.clone(), invalidation),
    }
}

#[tokio::test]
async fn updated_listing_is_visible_on_next_read() {
    let store = MemoryMarketplace::new();
    let seller = Uuid::new_v4();
    let listing = sample_listing("Eski saat", 500, seller);
    let id = listing.id;
    store.seed_listing(listing).await;
    let services = services(&store);

    let before = services.listings.detail(id).await.expect("detail");
    let full_before = services.listings.detail_full(id).await.expect("full detail");
    assert_eq!(before.price, Decimal::from(500));
    assert_eq!(full_before.listing.price, Decimal::from(500));

    services.listings.detail(id).await.expect("cached detail");
    assert_eq!(store.details(), 2);

    services
        .listings
        .update(
            &Actor::user(seller),
            UpdateListingCommand {
                id,
                price: Some(Decimal::from(450)),
                ..Default::default()
            },
        )
        .await
        .expect("owner update");

    let after = services.listings.detail(id).await.expect("detail after update");
    let full_after = services
        .listings
        .detail_full(id)
        .await
        .expect("full detail after update");
    assert_eq!(after.price, Decimal::from(450));
    assert_eq!(full_after.listing.price, Decimal::from(450));
}

#[tokio::test]
async fn read_in_flight_during_update_does_not_repopulate_cache() {
    let store = MemoryMarketplace::new();
    let seller = Uuid::new_v4();
    let listing = sample_listing("Duvar saati", 500, seller);
    let id = listing.id;
    store.seed_listing(listing).await;
    let services = services(&store);

    let gate = store.hold_next_detail();
    let reader = {
        let listings = services.listings.clone();
        tokio::spawn(async move { listings.detail(id).await })
    };
    gate.entered.notified().await;

    services
        .listings
        .update(
            &Actor::user(seller),
            UpdateListingCommand {
                id,
                price: Some(Decimal::from(450)),
                ..Default::default()
            },
        )
        .await
        .expect("owner update");
    gate.release.notify_one();

    let in_flight = reader
        .await
        .expect("reader task")
        .expect("in-flight detail");
    assert_eq!(in_flight.price, Decimal::from(500));

    let next = services.listings.detail(id).await.expect("next detail");
    assert_eq!(next.price, Decimal::from(450));
}

#[tokio::test]
async fn deleted_listing_is_not_served_from_cache() {
    let store = MemoryMarketplace::new();
    let seller = Uuid::new_v4();
    let listing = sample_listing("Halı", 1_200, seller);
    let id = listing.id;
    store.seed_listing(listing).await;
    let services = services(&store);

    services.listings.detail(id).await.expect("warm detail");
    services
        .listings
        .delete(&Actor::admin(Uuid::new_v4()), id)
        .await
        .expect("admin delete");

    let err = services
        .listings
        .detail(id)
        .await
        .expect_err("listing is gone");
    assert!(matches!(
        err,
        ListingError::Domain(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn strangers_cannot_update_a_listing() {
    let store = MemoryMarketplace::new();
    let listing = sample_listing("Lamba", 60, Uuid::new_v4());
    let id = listing.id;
    store.seed_listing(listing).await;
    let services = services(&store);

    let err = services
        .listings
        .update(
            &Actor::user(Uuid::new_v4()),
            UpdateListingCommand {
                id,
                title: Some("Çalıntı".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect_err("not the owner");
    assert!(matches!(
        err,
        ListingError::Domain(DomainError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn favorite_toggle_refreshes_batch_checks() {
    let store = MemoryMarketplace::new();
    let seller = Uuid::new_v4();
    let first = sample_listing("Kilim", 800, seller);
    let second = sample_listing("Sehpa", 250, seller);
    let (first_id, second_id) = (first.id, second.id);
    store.seed_listing(first).await;
    store.seed_listing(second).await;
    let services = services(&store);
    let buyer = Uuid::new_v4();

    let none = services
        .favorites
        .check_batch(buyer, &[second_id, first_id])
        .await
        .expect("batch check");
    assert!(none.is_empty());

    let reordered = services
        .favorites
        .check_batch(buyer, &[first_id, second_id, first_id])
        .await
        .expect("same set, other order");
    assert!(reordered.is_empty());
    assert_eq!(store.favorite_lookups(), 1);

    let favorited = services
        .favorites
        .toggle(buyer, first_id)
        .await
        .expect("toggle on");
    assert!(favorited);

    let after = services
        .favorites
        .check_batch(buyer, &[first_id, second_id])
        .await
        .expect("batch after toggle");
    assert_eq!(after, vec![first_id]);
    assert_eq!(store.favorite_lookups(), 2);
}

#[tokio::test]
async fn favorite_count_in_full_detail_follows_toggles() {
    let store = MemoryMarketplace::new();
    let listing = sample_listing("Ayna", 120, Uuid::new_v4());
    let id = listing.id;
    store.seed_listing(listing).await;
    let services = services(&store);

    let before = services.listings.detail_full(id).await.expect("full detail");
    assert_eq!(before.favorite_count, 0);

    services
        .favorites
        .toggle(Uuid::new_v4(), id)
        .await
        .expect("toggle");

    let after = services.listings.detail_full(id).await.expect("full detail");
    assert_eq!(after.favorite_count, 1);
}

#[tokio::test]
async fn new_message_appears_in_cached_window() {
    let store = MemoryMarketplace::new();
    let services = services(&store);
    let conversation = Uuid::new_v4();
    let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

    services
        .messages
        .send(conversation, alice, "Merhaba, hâlâ satılık mı?")
        .await
        .expect("send");
    let first = services
        .messages
        .window(conversation, 1, 20)
        .await
        .expect("window");
    assert_eq!(first.messages.len(), 1);

    services
        .messages
        .send(conversation, bob, "Evet, satılık.")
        .await
        .expect("reply");
    let second = services
        .messages
        .window(conversation, 1, 20)
        .await
        .expect("window after reply");
    assert_eq!(second.messages.len(), 2);
    assert!(second.messages.iter().any(|m| m.body == "Evet, satılık."));

    let updated = services
        .messages
        .mark_read(conversation, alice)
        .await
        .expect("mark read");
    assert_eq!(updated, 1);
    let third = services
        .messages
        .window(conversation, 1, 20)
        .await
        .expect("window after read");
    assert!(third.messages.iter().find(|m| m.sender_id == bob).is_some_and(|m| m.read));
}
