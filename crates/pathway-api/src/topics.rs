use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use pathway_db::queries::DEFAULT_POST_AUTHOR;
use pathway_types::api::{ReplyDraft, TopicDraft};

use crate::auth::{AppState, blocking};
use crate::body::JsonBody;
use crate::error::ApiError;

const DEFAULT_CATEGORY: &str = "General";

/// GET /api/topics: summaries, newest first.
pub async fn list_topics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let topics = blocking(&state, |db| db.list_topics()).await?;
    Ok(Json(topics))
}

/// GET /api/topics/{topic_id}: topic with its posts, oldest post first.
pub async fn get_topic(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = blocking(&state, move |db| db.get_topic_detail(&topic_id))
        .await?
        .ok_or(ApiError::NotFound("Topic not found."))?;
    Ok(Json(detail))
}

/// POST /api/topics: a non-empty `text` becomes the first post.
pub async fn create_topic(
    State(state): State<AppState>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let draft = TopicDraft {
        title: body.text("title").ok_or(ApiError::Validation("Title is required."))?,
        category: body
            .text("category")
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        text: body.text("text"),
    };

    let detail = blocking(&state, move |db| db.create_topic(&draft)).await?;
    info!(
        "Topic {} created with {} post(s)",
        detail.topic.id, detail.topic.replies_count
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// POST /api/topics/{topic_id}/posts
pub async fn post_reply(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
    body: JsonBody,
) -> Result<impl IntoResponse, ApiError> {
    let draft = ReplyDraft {
        author: body
            .text("author")
            .unwrap_or_else(|| DEFAULT_POST_AUTHOR.to_string()),
        text: body.text("text").ok_or(ApiError::Validation("Reply text is required."))?,
    };

    let detail = blocking(&state, move |db| db.add_reply(&topic_id, &draft))
        .await?
        .ok_or(ApiError::NotFound("Topic not found."))?;
    info!(
        "Reply added to topic {} ({} replies)",
        detail.topic.id, detail.topic.replies_count
    );
    Ok((StatusCode::CREATED, Json(detail)))
}
