use std::time::Instant;

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{HeaderValue, Method, Request, StatusCode, Uri, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, error, info_span, warn};
use uuid::Uuid;

use crate::{application::error::ErrorReport, domain::types::Actor};

use super::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Adopt the gateway's `x-request-id` when it is usable, otherwise mint one.
///
/// The id is echoed on the response and recorded on a span that wraps the
/// rest of the stack.
pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
    });

    let span = info_span!("request", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Log every 4xx at `warn` and every 5xx at `error`, with the handler's
/// [`ErrorReport`] when one was attached.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let mut response = next.run(request).await;
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let report = response.extensions_mut().remove::<ErrorReport>();
        log_failure(status, &method, &uri, &user_id, started, report);
    }
    response
}

fn log_failure(
    status: StatusCode,
    method: &Method,
    uri: &Uri,
    user_id: &str,
    started: Instant,
    report: Option<ErrorReport>,
) {
    let (source, chain) = report
        .map(|report| (report.source, report.messages))
        .unwrap_or(("unknown", Vec::new()));
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let path = uri.path();
    let query = uri.query().unwrap_or("");

    if status.is_server_error() {
        error!(
            target = "pazar::http::response",
            status = status.as_u16(),
            %method,
            path,
            query,
            elapsed_ms,
            source,
            ?chain,
            user_id,
            "request failed"
        );
    } else {
        warn!(
            target = "pazar::http::response",
            status = status.as_u16(),
            %method,
            path,
            query,
            elapsed_ms,
            source,
            ?chain,
            user_id,
            "request rejected"
        );
    }
}

/// The caller identity taken from the `x-user-id` and `x-user-role` headers.
///
/// Authentication happens upstream; this only reads what the gateway forwarded.
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or_else(ApiError::unauthorized)?;

        let is_admin = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|role| role.trim().eq_ignore_ascii_case("admin"));

        let actor = if is_admin {
            Actor::admin(user_id)
        } else {
            Actor::user(user_id)
        };
        Ok(Self(actor))
    }
}
