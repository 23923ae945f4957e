use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{FavoritesRepo, RepoError};
use crate::cache::{BATCH_FAVORITES_PREFIX, CatalogCaches, InvalidationCoordinator, batch_key};

/// Upper bound on ids accepted by one batch check.
pub const MAX_BATCH_IDS: usize = 100;

#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("{0}")]
    ConstraintViolation(&'static str),
    #[error("listing not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FavoriteService {
    repo: Arc<dyn FavoritesRepo>,
    caches: Arc<CatalogCaches>,
    invalidation: Arc<InvalidationCoordinator>,
}

impl FavoriteService {
    pub fn new(repo: Arc<dyn FavoritesRepo>, invalidation: Arc<InvalidationCoordinator>) -> Self {
        Self {
            repo,
            caches: invalidation.caches().clone(),
            invalidation,
        }
    }

    /// Flip the favorite flag. Returns whether the listing is now a favorite.
    pub async fn toggle(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool, FavoriteError> {
        let favorited = self
            .repo
            .toggle_favorite(user_id, listing_id)
            .await
            .map_err(|err| match err {
                RepoError::NotFound => FavoriteError::NotFound,
                other => FavoriteError::Repo(other),
            })?;
        self.invalidation.favorite_toggled(user_id, listing_id);

        debug!(
            target = "pazar::favorites",
            user_id = %user_id,
            listing_id = %listing_id,
            favorited,
            "Favorite toggled"
        );
        Ok(favorited)
    }

    /// The subset of `listing_ids` the user has favorited, sorted.
    pub async fn check_batch(
        &self,
        user_id: Uuid,
        listing_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, FavoriteError> {
        let mut ids = listing_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_BATCH_IDS {
            return Err(FavoriteError::ConstraintViolation("too many ids in one batch"));
        }

        let items: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let key = batch_key(BATCH_FAVORITES_PREFIX, &user_id.to_string(), &items);
        if let Some(cached) = self.caches.batch_favorites.get(&key) {
            return Ok(cached);
        }

        let epoch = self.caches.batch_favorites.epoch();
        let mut favorited = self.repo.favorited_among(user_id, &ids).await?;
        favorited.sort_unstable();
        self.caches
            .batch_favorites
            .set_if_epoch(epoch, key, favorited.clone(), None);
        Ok(favorited)
    }
}
