mod error;
mod handlers;
mod middleware;
mod models;
mod state;

pub use error::{ApiError, ApiErrorBody};
pub use middleware::{CurrentActor, REQUEST_ID_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};
pub use state::HttpState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/listings",
            get(handlers::list_listings).post(handlers::create_listing),
        )
        .route(
            "/api/listings/{id}",
            get(handlers::get_listing)
                .patch(handlers::update_listing)
                .delete(handlers::delete_listing),
        )
        .route("/api/listings/{id}/full", get(handlers::get_listing_full))
        .route("/api/material-types", get(handlers::list_material_types))
        .route(
            "/api/favorites/{listing_id}/toggle",
            post(handlers::toggle_favorite),
        )
        .route("/api/favorites/check", get(handlers::check_favorites))
        .route(
            "/api/conversations/{id}/messages",
            get(handlers::list_messages).post(handlers::send_message),
        )
        .route(
            "/api/conversations/{id}/read",
            post(handlers::mark_messages_read),
        )
        .route("/admin/cache/clear", post(handlers::clear_caches))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}
