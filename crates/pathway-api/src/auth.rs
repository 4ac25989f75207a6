use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use tracing::{error, warn};

use pathway_db::Database;

use crate::error::ApiError;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";
pub const USER_ID_HEADER: &str = "x-user-id";
pub const DELETE_CONFIRM_HEADER: &str = "x-delete-confirm";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// Shared admin secret. `None` disables every admin-gated route.
    pub admin_key: Option<String>,
    pub cors_origin: String,
}

/// Run a store call off the async runtime.
pub async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::Internal)
}

/// Trimmed header value, `None` when missing, non-UTF-8 or blank.
pub fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// True only when a key is configured and the caller sent exactly that key.
pub fn is_admin(headers: &HeaderMap, configured: Option<&str>) -> bool {
    let Some(expected) = configured.filter(|k| !k.is_empty()) else {
        return false;
    };
    header_text(headers, ADMIN_KEY_HEADER).as_deref() == Some(expected)
}

/// Extractor that rejects with 403 unless the admin key matches.
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if is_admin(&parts.headers, state.admin_key.as_deref()) {
            Ok(Self)
        } else {
            warn!("Admin check failed for {} {}", parts.method, parts.uri.path());
            Err(ApiError::Forbidden)
        }
    }
}

/// Who the caller claims to be.
///
/// `user_id` comes straight from `X-User-Id` and is not verified: any caller
/// can assert any id. Export and erasure accept it as proof of self.
#[derive(Debug, Clone)]
pub struct Caller {
    pub admin: bool,
    pub user_id: Option<String>,
}

impl Caller {
    pub fn is_self(&self, target_id: &str) -> bool {
        self.user_id.as_deref() == Some(target_id)
    }
}

impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self {
            admin: is_admin(&parts.headers, state.admin_key.as_deref()),
            user_id: header_text(&parts.headers, USER_ID_HEADER),
        })
    }
}
