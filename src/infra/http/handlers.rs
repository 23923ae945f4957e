use std::error::Error as StdError;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::info;
use uuid::Uuid;

use crate::application::catalog::CatalogError;
use crate::application::error::ErrorReport;
use crate::application::listings::{CreateListingCommand, UpdateListingCommand};
use crate::application::messages::DEFAULT_WINDOW_LIMIT;
use crate::application::pagination::{Pagination, normalize_page};
use crate::application::repos::RepoError;
use crate::domain::filters::{Filters, should_clear_material};
use crate::domain::types::SortBy;

use super::error::{
    ApiError, favorite_to_api, listing_to_api, message_to_api, repo_to_api,
};
use super::middleware::CurrentActor;
use super::models::*;
use super::state::HttpState;

const CATALOG_SOURCE: &str = "infra::http::handlers::list_listings";

pub async fn health(State(state): State<HttpState>) -> Response {
    match state.health.ping().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::handlers::health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Catalog page plus the category and material vocabularies.
///
/// The material filter is checked against the selected category's vocabulary
/// before the query runs and dropped when it does not belong there.
pub async fn list_listings(
    State(state): State<HttpState>,
    Query(query): Query<CatalogQuery>,
) -> Response {
    let page = normalize_page(query.page.as_deref());
    let sort_by = SortBy::parse_lenient(query.sort_by.as_deref());
    let mut filters = Filters::from_raw(&query.filters);

    let vocabulary = futures::try_join!(
        state.materials.categories(),
        state.materials.materials_for(filters.category),
    );
    let (categories, material_types) = match vocabulary {
        Ok(lists) => lists,
        Err(err) => return catalog_failure(page, repo_status(&err), &err),
    };

    if should_clear_material(filters.material, &material_types) {
        filters.material = None;
    }

    match state.catalog.query(page, sort_by, &filters).await {
        Ok(result) => Json(ApiResponse::ok(CatalogData {
            items: result.items,
            categories,
            material_types,
            pagination: result.pagination,
        }))
        .into_response(),
        Err(err) => {
            let status = match &err {
                CatalogError::Timeout(_) | CatalogError::Store(RepoError::Timeout) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                CatalogError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            catalog_failure(page, status, &err)
        }
    }
}

fn repo_status(err: &RepoError) -> StatusCode {
    match err {
        RepoError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn catalog_failure(page: u32, status: StatusCode, err: &dyn StdError) -> Response {
    let body = CatalogFailure {
        success: false,
        message: "Listings could not be loaded",
        data: CatalogData {
            items: Vec::new(),
            categories: Vec::new(),
            material_types: Vec::new(),
            pagination: Pagination::empty(page),
        },
    };
    let mut response = (status, Json(body)).into_response();
    ErrorReport::from_error(CATALOG_SOURCE, status, err).attach(&mut response);
    response
}

pub async fn list_material_types(
    State(state): State<HttpState>,
    Query(query): Query<MaterialTypesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let category_id = query
        .category_id
        .as_deref()
        .and_then(|value| Uuid::parse_str(value.trim()).ok());

    let materials = state
        .materials
        .materials_for(category_id)
        .await
        .map_err(repo_to_api)?;

    Ok(Json(ApiResponse::ok(materials)))
}

pub async fn get_listing(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let listing = state.listings.detail(id).await.map_err(listing_to_api)?;
    Ok(Json(ApiResponse::ok(listing)))
}

pub async fn get_listing_full(
    State(state): State<HttpState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state
        .listings
        .detail_full(id)
        .await
        .map_err(listing_to_api)?;
    Ok(Json(ApiResponse::ok(detail)))
}

pub async fn create_listing(
    State(state): State<HttpState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<ListingCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateListingCommand {
        title: payload.title,
        description: payload.description,
        price: payload.price,
        condition: payload.condition,
        images: payload.images,
        location: payload.location,
        category_id: payload.category_id,
        material_id: payload.material_id,
    };

    let listing = state
        .listings
        .create(&actor, command)
        .await
        .map_err(listing_to_api)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(listing))))
}

pub async fn update_listing(
    State(state): State<HttpState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(payload): Json<ListingUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdateListingCommand {
        id,
        title: payload.title,
        description: payload.description,
        price: payload.price,
        condition: payload.condition,
        images: payload.images,
        location: payload.location,
        category_id: payload.category_id,
        material_id: payload.material_id,
    };

    let listing = state
        .listings
        .update(&actor, command)
        .await
        .map_err(listing_to_api)?;

    Ok(Json(ApiResponse::ok(listing)))
}

pub async fn delete_listing(
    State(state): State<HttpState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .listings
        .delete(&actor, id)
        .await
        .map_err(listing_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_favorite(
    State(state): State<HttpState>,
    CurrentActor(actor): CurrentActor,
    Path(listing_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let favorited = state
        .favorites
        .toggle(actor.user_id, listing_id)
        .await
        .map_err(favorite_to_api)?;

    Ok(Json(ApiResponse::ok(FavoriteToggleData {
        listing_id,
        favorited,
    })))
}

/// Comma-separated ids; entries that are not UUIDs are ignored.
pub async fn check_favorites(
    State(state): State<HttpState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<FavoritesCheckQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ids: Vec<Uuid> = query
        .ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter_map(|value| Uuid::parse_str(value.trim()).ok())
        .collect();

    let favorited_ids = state
        .favorites
        .check_batch(actor.user_id, &ids)
        .await
        .map_err(favorite_to_api)?;

    Ok(Json(ApiResponse::ok(FavoritesCheckData { favorited_ids })))
}

pub async fn list_messages(
    State(state): State<HttpState>,
    CurrentActor(_actor): CurrentActor,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<MessagesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = normalize_page(query.page.as_deref());
    let limit = query
        .limit
        .as_deref()
        .and_then(|value| value.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_WINDOW_LIMIT);

    let window = state
        .messages
        .window(conversation_id, page, limit)
        .await
        .map_err(message_to_api)?;

    Ok(Json(ApiResponse::ok(window)))
}

pub async fn send_message(
    State(state): State<HttpState>,
    CurrentActor(actor): CurrentActor,
    Path(conversation_id): Path<Uuid>,
    Json(payload): Json<MessageSendRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let message = state
        .messages
        .send(conversation_id, actor.user_id, &payload.body)
        .await
        .map_err(message_to_api)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(message))))
}

pub async fn mark_messages_read(
    State(state): State<HttpState>,
    CurrentActor(actor): CurrentActor,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state
        .messages
        .mark_read(conversation_id, actor.user_id)
        .await
        .map_err(message_to_api)?;

    Ok(Json(ApiResponse::ok(MarkReadData { updated })))
}

pub async fn clear_caches(
    State(state): State<HttpState>,
    CurrentActor(actor): CurrentActor,
) -> Result<impl IntoResponse, ApiError> {
    if !actor.is_admin() {
        return Err(ApiError::forbidden("Administrator role required"));
    }

    state.invalidation.clear_all();
    info!(
        target = "pazar::http::admin",
        actor = %actor.user_id,
        "Caches cleared"
    );

    Ok(Json(ApiResponse::ok(CacheClearData { cleared: true })))
}
