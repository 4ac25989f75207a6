use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use pathway_api::{AppStateInner, router};
use pathway_db::Database;

const ADMIN_KEY: &str = "test-admin-key";

fn app() -> Router {
    let db = Database::open_in_memory().unwrap();
    router(Arc::new(AppStateInner {
        db,
        admin_key: Some(ADMIN_KEY.to_string()),
        cors_origin: "*".to_string(),
    }))
}

fn seeded_app() -> Router {
    let db = Database::open_in_memory().unwrap();
    db.seed_defaults().unwrap();
    router(Arc::new(AppStateInner {
        db,
        admin_key: Some(ADMIN_KEY.to_string()),
        cors_origin: "*".to_string(),
    }))
}

async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: Body,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    send_raw(app, method, uri, headers, body).await
}

async fn register(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/users/register", &[], Some(body)).await
}

// -- Dispatch --

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/health", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn unknown_route_and_wrong_method_are_not_found() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/nope", &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found." }));

    let (status, body) = send(&app, Method::PUT, "/api/contacts", &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found." }));
}

#[tokio::test]
async fn not_found_responses_carry_cors_headers() {
    let app = app();
    for (method, uri) in [(Method::PUT, "/api/contacts"), (Method::GET, "/api/nope")] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("origin", "http://localhost:5173")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}

#[tokio::test]
async fn options_is_always_no_content() {
    let app = app();
    for uri in ["/api/contacts", "/api/users/u1", "/anything"] {
        let (status, body) = send(&app, Method::OPTIONS, uri, &[], None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
    }
}

// -- Contacts --

#[tokio::test]
async fn malformed_body_reports_missing_field() {
    let app = app();

    let (status, body) = send_raw(
        &app,
        Method::POST,
        "/api/contacts",
        &[("content-type", "application/json")],
        Body::from("{\"name\": "),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name is required.");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/contacts",
        &[],
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name is required.");
}

#[tokio::test]
async fn contacts_create_list_and_delete() {
    let app = app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/contacts",
        &[],
        Some(json!({ "name": " Sam ", "phone": "07700 900000", "email": " Sam@Example.ORG " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Sam");
    assert_eq!(created["email"], "sam@example.org");
    let id = created["id"].as_str().unwrap().to_string();

    let (_, list) = send(&app, Method::GET, "/api/contacts", &[], None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);

    let uri = format!("/api/contacts/{}", id);
    let (status, fetched) = send(&app, Method::GET, &uri, &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, _) = send(&app, Method::DELETE, &uri, &[], None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::DELETE, &uri, &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Contact not found.");
}

// -- Sponsor plan --

#[tokio::test]
async fn sponsor_plan_is_null_then_upserted() {
    let app = app();

    let (status, plan) = send(&app, Method::GET, "/api/sponsor-plan", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan, Value::Null);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/sponsor-plan",
        &[],
        Some(json!({ "reachOut": "Call Sam" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, saved) = send(
        &app,
        Method::PUT,
        "/api/sponsor-plan",
        &[],
        Some(json!({ "reachOut": "Call Sam", "boundary": "Not after 10pm" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["checkInFrequency"], "daily");
    assert_eq!(saved["backupContact"], "");

    let (_, replaced) = send(
        &app,
        Method::PUT,
        "/api/sponsor-plan",
        &[],
        Some(json!({ "reachOut": "Text Priya", "boundary": "Weekends off", "checkInFrequency": "weekly" })),
    )
    .await;

    let (_, plan) = send(&app, Method::GET, "/api/sponsor-plan", &[], None).await;
    assert_eq!(plan["reachOut"], "Text Priya");
    assert_eq!(plan["checkInFrequency"], "weekly");
    assert_eq!(plan, replaced);
}

// -- Messages --

#[tokio::test]
async fn risky_message_is_flagged_with_prompt() {
    let app = seeded_app();

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/messages",
        &[],
        Some(json!({ "sender": "Alex", "text": "I feel like I might relapse tonight" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["safeguardingFlag"], true);
    assert!(!created["safeguardingPrompt"].as_str().unwrap().is_empty());

    let (_, list) = send(&app, Method::GET, "/api/messages", &[], None).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 4);
    assert_eq!(list[0]["id"], created["id"]);
    assert_eq!(list[0]["safeguardingFlag"], true);
    assert!(list[0].get("safeguardingPrompt").is_none());
}

#[tokio::test]
async fn ordinary_message_has_no_prompt() {
    let app = app();

    let long_text = "See you at the group. ".repeat(10);
    let (status, created) = send(
        &app,
        Method::POST,
        "/api/messages",
        &[],
        Some(json!({ "sender": "Jordan", "text": long_text })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["safeguardingFlag"], false);
    assert!(created.get("safeguardingPrompt").is_none());

    let snippet = created["snippet"].as_str().unwrap();
    assert_eq!(snippet.chars().count(), 120);
    assert!(snippet.ends_with("..."));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/messages",
        &[],
        Some(json!({ "sender": "Jordan" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Sender and message text are required.");
}

// -- Topics --

#[tokio::test]
async fn topic_reply_counter_follows_posts() {
    let app = app();

    let (status, bare) = send(
        &app,
        Method::POST,
        "/api/topics",
        &[],
        Some(json!({ "title": "Quiet topic" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(bare["repliesCount"], 0);
    assert_eq!(bare["category"], "General");

    let (_, topic) = send(
        &app,
        Method::POST,
        "/api/topics",
        &[],
        Some(json!({ "title": "Interviews", "category": "Work", "text": "Any tips?" })),
    )
    .await;
    assert_eq!(topic["repliesCount"], 1);
    assert_eq!(topic["posts"][0]["author"], "You");

    let uri = format!("/api/topics/{}/posts", topic["id"].as_str().unwrap());
    let (status, replied) = send(
        &app,
        Method::POST,
        &uri,
        &[],
        Some(json!({ "author": "Leah", "text": "Practice out loud." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(replied["repliesCount"], 2);
    assert_eq!(replied["lastUpdated"], "Just now");
    assert_eq!(replied["posts"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, Method::POST, &uri, &[], Some(json!({ "text": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Reply text is required.");

    let (_, list) = send(&app, Method::GET, "/api/topics", &[], None).await;
    assert_eq!(list[0]["id"], topic["id"]);
}

#[tokio::test]
async fn unknown_topic_is_not_found() {
    let app = app();

    let (status, _) = send(&app, Method::GET, "/api/topics/missing", &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/topics/missing/posts",
        &[],
        Some(json!({ "text": "Hello?" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Topic not found.");
}

#[tokio::test]
async fn seeded_topics_are_readable() {
    let app = seeded_app();
    let (status, topic) = send(&app, Method::GET, "/api/topics/staying-positive", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(topic["repliesCount"], 2);
    assert_eq!(topic["posts"][0]["author"], "Alex");
}

// -- Users --

#[tokio::test]
async fn user_admin_routes_need_key() {
    let app = app();

    for key in [None, Some("wrong")] {
        let headers: Vec<(&str, &str)> = key.map(|k| ("x-admin-key", k)).into_iter().collect();
        let (status, body) = send(&app, Method::GET, "/api/users", &headers, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden.");
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/users",
        &[],
        Some(json!({ "name": "Jo" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn registration_requires_consent() {
    let app = app();

    let (status, body) = register(&app, json!({ "name": "Jo" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Consent must be accepted to register.");

    let (status, body) = register(&app, json!({ "consentAccepted": true })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name is required.");
}

#[tokio::test]
async fn registering_twice_updates_same_profile() {
    let app = app();

    let (status, first) = register(
        &app,
        json!({ "name": "Jo", "email": "Jo@Example.org", "phone": "0700", "consentAccepted": true }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["email"], "jo@example.org");
    assert_eq!(first["consentVersion"], "2026-02-07");
    assert_eq!(first["safeguardingOptIn"], true);

    let (status, second) = register(
        &app,
        json!({ "name": "Joanne", "email": "jo@example.org", "area": "Leeds", "consentAccepted": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["createdAt"], first["createdAt"]);
    assert_eq!(second["name"], "Joanne");
    assert_eq!(second["phone"], Value::Null);
    assert_eq!(second["area"], "Leeds");

    let (_, users) = send(
        &app,
        Method::GET,
        "/api/users",
        &[("x-admin-key", ADMIN_KEY)],
        None,
    )
    .await;
    assert_eq!(users.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn admin_may_register_without_consent() {
    let app = app();

    let (status, user) = send(
        &app,
        Method::POST,
        "/api/users",
        &[("x-admin-key", ADMIN_KEY)],
        Some(json!({ "name": "Walk-in" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["consentGrantedAt"], Value::Null);

    let uri = format!("/api/users/{}", user["id"].as_str().unwrap());
    let (status, fetched) = send(&app, Method::GET, &uri, &[("x-admin-key", ADMIN_KEY)], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Walk-in");
}

#[tokio::test]
async fn export_is_for_self_or_admin() {
    let app = app();
    let (_, user) = register(&app, json!({ "name": "Jo", "consentAccepted": true })).await;
    let id = user["id"].as_str().unwrap();
    let uri = format!("/api/users/{}/export", id);

    let (status, export) = send(&app, Method::GET, &uri, &[("x-user-id", id)], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(export["user"]["id"], user["id"]);
    assert!(export["exportedAt"].is_string());

    let (status, _) = send(&app, Method::GET, &uri, &[("x-admin-key", ADMIN_KEY)], None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &uri, &[("x-user-id", "someone-else")], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, &uri, &[], None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn erasure_flow() {
    let app = app();
    let (_, user) = register(
        &app,
        json!({ "name": "Jo", "email": "jo@example.org", "consentAccepted": true }),
    )
    .await;
    let id = user["id"].as_str().unwrap().to_string();
    let uri = format!("/api/users/{}", id);

    // Someone else claiming to be a different user.
    let (status, _) = send(
        &app,
        Method::DELETE,
        &uri,
        &[("x-user-id", "u2"), ("x-delete-confirm", "DELETE")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::DELETE, &uri, &[("x-user-id", id.as_str())], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("DELETE"));

    let (status, _) = send(
        &app,
        Method::DELETE,
        &uri,
        &[("x-user-id", id.as_str()), ("x-delete-confirm", "yes")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &uri,
        &[("x-user-id", id.as_str()), ("x-delete-confirm", "DELETE")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let admin = [("x-admin-key", ADMIN_KEY)];
    let (_, users) = send(&app, Method::GET, "/api/users", &admin, None).await;
    assert!(users.as_array().unwrap().is_empty());

    let (status, _) = send(&app, Method::GET, &uri, &admin, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &uri,
        &[("x-admin-key", ADMIN_KEY), ("x-delete-confirm", "DELETE")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found.");

    // The erased email is free for a new registration.
    let (status, fresh) = register(
        &app,
        json!({ "name": "Jo", "email": "jo@example.org", "consentAccepted": true }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(fresh["id"], user["id"]);
}

// -- Jobs --

#[tokio::test]
async fn job_creation_needs_admin_and_inserts_nothing_otherwise() {
    let app = app();
    let job = json!({ "title": "Chef", "area": "Leeds", "summary": "Kitchen work." });

    let (status, _) = send(&app, Method::POST, "/api/jobs", &[], Some(job.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = [("x-admin-key", ADMIN_KEY)];
    let (status, jobs) = send(&app, Method::GET, "/api/jobs", &admin, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(jobs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn job_defaults_and_lenient_type() {
    let app = app();
    let admin = [("x-admin-key", ADMIN_KEY)];

    let (status, body) = send(&app, Method::POST, "/api/jobs", &admin, Some(json!({ "title": "Chef" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title, area, and summary are required.");

    let (status, created) = send(
        &app,
        Method::POST,
        "/api/jobs",
        &admin,
        Some(json!({
            "title": "Chef",
            "area": "Leeds",
            "summary": "Kitchen work.",
            "type": "Zero hours",
            "responsibilities": [],
            "requirements": ["Food hygiene certificate", "  "],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["type"], "Full time");
    assert_eq!(
        created["responsibilities"],
        json!(["Discuss this role with your adviser."])
    );
    assert_eq!(created["requirements"], json!(["Food hygiene certificate"]));
    assert_eq!(created["howToApply"], json!(["Contact your adviser to apply"]));

    let uri = format!("/api/jobs/{}", created["id"].as_str().unwrap());
    let (status, fetched) = send(&app, Method::GET, &uri, &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, body) = send(&app, Method::GET, "/api/jobs/missing", &[], None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Job not found.");
}

#[tokio::test]
async fn helplines_are_public() {
    let app = app();
    let (status, lines) = send(&app, Method::GET, "/api/safeguarding/helplines", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lines[0]["phone"], "999");
}
