use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;

use pathway_types::api::{Registration, UserExport};
use pathway_types::models::User;

use crate::auth::{AppState, Caller, RequireAdmin, blocking};
use crate::body::JsonBody;
use crate::consent::{
    RegistrationPath, authorize_profile_access, registration_draft, require_erasure_confirmation,
};
use crate::error::ApiError;

/// GET /api/users: admin only, erased profiles excluded.
pub async fn list_users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<impl IntoResponse, ApiError> {
    let users = blocking(&state, |db| db.list_users()).await?;
    Ok(Json(users))
}

/// GET /api/users/{user_id}: admin only.
pub async fn get_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = blocking(&state, move |db| db.get_user(&user_id))
        .await?
        .ok_or(ApiError::NotFound("User not found."))?;
    Ok(Json(user))
}

/// GET /api/users/{user_id}/export: admin or the user themself.
pub async fn export_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authorize_profile_access(&caller, &user_id)?;

    let user = blocking(&state, move |db| db.get_user(&user_id))
        .await?
        .ok_or(ApiError::NotFound("User not found."))?;

    info!("Profile {} exported (admin: {})", user.id, caller.admin);
    Ok(Json(UserExport {
        exported_at: Utc::now(),
        user,
    }))
}

/// DELETE /api/users/{user_id}: admin or the user themself, with the
/// confirmation header. Authorization is checked before confirmation.
pub async fn erase_user(
    State(state): State<AppState>,
    caller: Caller,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authorize_profile_access(&caller, &user_id)?;
    require_erasure_confirmation(&headers)?;

    let id = user_id.clone();
    if !blocking(&state, move |db| db.erase_user(&id)).await? {
        return Err(ApiError::NotFound("User not found."));
    }

    info!("Profile {} erased (admin: {})", user_id, caller.admin);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/users/register: public; consent must be accepted.
pub async fn register(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    upsert(state, &body, RegistrationPath::SelfService).await
}

/// POST /api/users: admin only; consent optional.
pub async fn create_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    upsert(state, &body, RegistrationPath::Admin).await
}

async fn upsert(
    state: AppState,
    body: &JsonBody,
    path: RegistrationPath,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let draft = registration_draft(body, path, Utc::now())?;
    let registration = blocking(&state, move |db| db.register_user(&draft)).await?;

    let status = match &registration {
        Registration::Created(user) => {
            info!("Profile {} registered ({:?})", user.id, path);
            StatusCode::CREATED
        }
        Registration::Updated(user) => {
            info!("Profile {} updated by re-registration ({:?})", user.id, path);
            StatusCode::OK
        }
    };

    Ok((status, Json(registration.into_user())))
}
