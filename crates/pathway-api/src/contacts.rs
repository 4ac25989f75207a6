use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use pathway_types::api::ContactDraft;

use crate::auth::{AppState, blocking};
use crate::body::JsonBody;
use crate::error::ApiError;

/// GET /api/contacts: oldest first.
pub async fn list_contacts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let contacts = blocking(&state, |db| db.list_contacts()).await?;
    Ok(Json(contacts))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let contact = blocking(&state, move |db| db.get_contact(&contact_id))
        .await?
        .ok_or(ApiError::NotFound("Contact not found."))?;
    Ok(Json(contact))
}

pub async fn create_contact(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let draft = ContactDraft {
        name: body.text("name").ok_or(ApiError::Validation("Name is required."))?,
        phone: body.text("phone"),
        email: body.email("email"),
    };

    let contact = blocking(&state, move |db| db.insert_contact(&draft)).await?;
    info!("Contact {} created", contact.id);
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(contact_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = contact_id.clone();
    if !blocking(&state, move |db| db.delete_contact(&id)).await? {
        return Err(ApiError::NotFound("Contact not found."));
    }
    info!("Contact {} deleted", contact_id);
    Ok(StatusCode::NO_CONTENT)
}
