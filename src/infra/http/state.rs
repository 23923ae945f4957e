use std::sync::Arc;

use crate::application::catalog::CatalogQueryEngine;
use crate::application::favorites::FavoriteService;
use crate::application::listings::ListingService;
use crate::application::materials::MaterialResolver;
use crate::application::messages::MessageService;
use crate::application::repos::HealthRepo;
use crate::cache::InvalidationCoordinator;

#[derive(Clone)]
pub struct HttpState {
    pub catalog: Arc<CatalogQueryEngine>,
    pub materials: MaterialResolver,
    pub listings: ListingService,
    pub favorites: FavoriteService,
    pub messages: MessageService,
    pub invalidation: Arc<InvalidationCoordinator>,
    pub health: Arc<dyn HealthRepo>,
}
