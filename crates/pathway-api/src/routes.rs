use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use pathway_types::api::HealthResponse;

use crate::auth::{ADMIN_KEY_HEADER, AppState, DELETE_CONFIRM_HEADER, USER_ID_HEADER};
use crate::middleware::{answer_preflight, not_found};
use crate::{contacts, jobs, messages, safeguarding, sponsor, topics, users};

/// Build the full API router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/contacts",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route(
            "/api/contacts/{contact_id}",
            get(contacts::get_contact).delete(contacts::delete_contact),
        )
        .route(
            "/api/sponsor-plan",
            get(sponsor::get_plan).put(sponsor::save_plan),
        )
        .route(
            "/api/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .route(
            "/api/safeguarding/helplines",
            get(safeguarding::list_helplines),
        )
        .route(
            "/api/topics",
            get(topics::list_topics).post(topics::create_topic),
        )
        .route("/api/topics/{topic_id}", get(topics::get_topic))
        .route("/api/topics/{topic_id}/posts", post(topics::post_reply))
        .route(
            "/api/users",
            get(users::list_users).post(users::create_user),
        )
        .route("/api/users/register", post(users::register))
        .route(
            "/api/users/{user_id}",
            get(users::get_user).delete(users::erase_user),
        )
        .route("/api/users/{user_id}/export", get(users::export_user))
        .route("/api/jobs", get(jobs::list_jobs).post(jobs::create_job))
        .route("/api/jobs/{job_id}", get(jobs::get_job))
        .fallback(not_found)
        .method_not_allowed_fallback(not_found)
        .with_state(state.clone());

    api.layer(cors_layer(&state.cors_origin))
        .layer(middleware::from_fn_with_state(state, answer_preflight))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = match HeaderValue::from_str(origin) {
        Ok(value) if origin != "*" => AllowOrigin::exact(value),
        _ => AllowOrigin::any(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(ADMIN_KEY_HEADER),
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(DELETE_CONFIRM_HEADER),
        ])
}
