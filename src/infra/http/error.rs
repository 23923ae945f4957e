use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::favorites::FavoriteError;
use crate::application::listings::ListingError;
use crate::application::messages::MessageError;
use crate::application::repos::RepoError;
use crate::domain::error::DomainError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub success: bool,
    pub message: String,
}

/// Failed request rendered as `{success: false, message}`.
///
/// `detail` never reaches the client; it is carried in the [`ErrorReport`]
/// for the response logging middleware.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: &'static str, detail: Option<String>) -> Self {
        Self {
            status,
            message,
            detail,
        }
    }

    pub fn bad_request(message: &'static str, detail: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, detail)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "A valid x-user-id header is required",
            None,
        )
    }

    pub fn forbidden(message: &'static str) -> Self {
        Self::new(StatusCode::FORBIDDEN, message, None)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            success: false,
            message: self.message.to_string(),
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            self.detail.as_deref().unwrap_or(self.message),
        )
        .attach(&mut response);
        response
    }
}

pub fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::bad_request("Invalid input", Some(message)),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            Some(message),
        ),
    }
}

pub fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::NotFound { .. } => ApiError::new(
            StatusCode::NOT_FOUND,
            "Resource not found",
            Some(err.to_string()),
        ),
        DomainError::Validation { message } => {
            ApiError::bad_request("Request could not be processed", Some(message))
        }
        DomainError::Forbidden { .. } => ApiError::new(
            StatusCode::FORBIDDEN,
            "Not allowed to modify this resource",
            Some(err.to_string()),
        ),
    }
}

pub fn listing_to_api(err: ListingError) -> ApiError {
    match err {
        ListingError::Domain(domain) => domain_to_api(domain),
        ListingError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn favorite_to_api(err: FavoriteError) -> ApiError {
    match err {
        FavoriteError::ConstraintViolation(reason) => {
            ApiError::bad_request("Invalid favorites request", Some(reason.to_string()))
        }
        FavoriteError::NotFound => ApiError::not_found("Listing not found"),
        FavoriteError::Repo(repo) => repo_to_api(repo),
    }
}

pub fn message_to_api(err: MessageError) -> ApiError {
    match err {
        MessageError::ConstraintViolation(reason) => {
            ApiError::bad_request("Invalid message", Some(reason.to_string()))
        }
        MessageError::Repo(repo) => repo_to_api(repo),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_listing_maps_to_403() {
        let err = ListingError::Domain(DomainError::forbidden("listing"));
        assert_eq!(listing_to_api(err).status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn repo_timeout_maps_to_503() {
        assert_eq!(
            repo_to_api(RepoError::Timeout).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn response_carries_report_with_detail() {
        let response =
            ApiError::bad_request("Invalid input", Some("price: bad".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let report = response
            .extensions()
            .get::<ErrorReport>()
            .expect("report attached");
        assert_eq!(report.messages, vec!["price: bad"]);
    }
}
