use async_trait::async_trait;
use uuid::Uuid;

use crate::application::repos::{FavoritesRepo, RepoError};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl FavoritesRepo for PostgresRepositories {
    async fn toggle_favorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<bool, RepoError> {
        let mut tx = self.pool().begin().await.map_err(map_sqlx_error)?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM listings WHERE id = $1)")
            .bind(listing_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        if !exists {
            return Err(RepoError::NotFound);
        }

        let removed = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND listing_id = $2")
            .bind(user_id)
            .bind(listing_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .rows_affected();

        if removed == 0 {
            sqlx::query(
                r#"
                INSERT INTO favorites (user_id, listing_id)
                VALUES ($1, $2)
                ON CONFLICT (user_id, listing_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(listing_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(removed == 0)
    }

    async fn favorited_among(
        &self,
        user_id: Uuid,
        listing_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, RepoError> {
        if listing_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_scalar(
            r#"
            SELECT listing_id
            FROM favorites
            WHERE user_id = $1 AND listing_id = ANY($2)
            ORDER BY listing_id
            "#,
        )
        .bind(user_id)
        .bind(listing_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
