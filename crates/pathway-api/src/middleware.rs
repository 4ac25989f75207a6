use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::AppState;
use crate::error::ApiError;

pub const ALLOWED_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type, X-Admin-Key, X-User-Id, X-Delete-Confirm";

/// Outermost request filter: answers every OPTIONS request with 204 and the
/// CORS preflight headers, whether or not the path is routed.
pub async fn answer_preflight(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return preflight(&state.cors_origin);
    }
    next.run(req).await
}

fn preflight(origin: &str) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_str(origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    response
}

/// Router fallback for unmatched routes and for known paths hit with an
/// unregistered method.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not found.")
}
