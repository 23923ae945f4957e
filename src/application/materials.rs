//! Category-dependent material vocabulary.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::repos::{CatalogRepo, RepoError};
use crate::domain::entities::{Category, MaterialType};
use crate::domain::filters;

/// Narrows the material vocabulary to what is valid under a category.
///
/// Category is the dominant filter and material the dependent one; callers
/// resolve [`MaterialResolver::should_clear_material`] before issuing a
/// catalog query, never after.
#[derive(Clone)]
pub struct MaterialResolver {
    repo: Arc<dyn CatalogRepo>,
}

impl MaterialResolver {
    pub fn new(repo: Arc<dyn CatalogRepo>) -> Self {
        Self { repo }
    }

    /// Materials ordered by name. With a category, that category's materials
    /// plus the unscoped ones; without, the full list.
    pub async fn materials_for(
        &self,
        category_id: Option<Uuid>,
    ) -> Result<Vec<MaterialType>, RepoError> {
        self.repo.list_material_types(category_id).await
    }

    pub async fn categories(&self) -> Result<Vec<Category>, RepoError> {
        self.repo.list_categories().await
    }

    /// Whether `selected` is not valid under `new_category` and must be reset.
    pub async fn should_clear_material(
        &self,
        selected: Option<Uuid>,
        new_category: Option<Uuid>,
    ) -> Result<bool, RepoError> {
        if selected.is_none() {
            return Ok(false);
        }
        let materials = self.materials_for(new_category).await?;
        Ok(filters::should_clear_material(selected, &materials))
    }
}
