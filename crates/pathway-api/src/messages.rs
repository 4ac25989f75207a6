use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{info, warn};

use pathway_types::api::{MessageCreated, MessageDraft};

use crate::auth::{AppState, blocking};
use crate::body::JsonBody;
use crate::error::ApiError;
use crate::safeguarding::{SAFEGUARDING_PROMPT, detect_risk};

/// GET /api/messages: newest first.
pub async fn get_messages(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let messages = blocking(&state, |db| db.list_messages()).await?;
    Ok(Json(messages))
}

/// POST /api/messages
///
/// The safeguarding flag is decided here, once, and stored with the message.
/// A flagged message gets the safeguarding prompt in the response only.
pub async fn send_message(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(sender), Some(text)) = (body.text("sender"), body.text("text")) else {
        return Err(ApiError::Validation("Sender and message text are required."));
    };

    let flagged = detect_risk(&text);
    let draft = MessageDraft { sender, text };
    let message = blocking(&state, move |db| db.insert_message(&draft, flagged)).await?;

    if flagged {
        // Never log the text itself.
        warn!("Message {} flagged for safeguarding", message.id);
    } else {
        info!("Message {} created", message.id);
    }

    Ok((
        StatusCode::CREATED,
        Json(MessageCreated {
            message,
            safeguarding_prompt: flagged.then(|| SAFEGUARDING_PROMPT.to_string()),
        }),
    ))
}
