//! Router integration tests.
//!
//! Exercises routing, validation, and the email paths that do not need
//! a live database: validation runs before any query, and the enquiry
//! route only touches storage when delivery fails.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use leadbox_api::{config::Config, create_router, AppState};
use leadbox_core::{storage::Storage, TestClock};
use leadbox_mailer::Mailer;
use leadbox_testing::FakeTransport;
use tower::ServiceExt;

fn test_state(transport: FakeTransport) -> AppState {
    let config = Config::default();
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("lazy pool");

    let clock = Arc::new(TestClock::new());
    let mailer =
        Mailer::with_clock(Arc::new(transport), config.retry_policy(), clock.clone());

    AppState::new(Arc::new(Storage::new(pool)), mailer, clock, Arc::new(config))
}

fn test_router(transport: FakeTransport) -> Router {
    create_router(test_state(transport))
}

async fn post_json(router: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");

    let response = router.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn liveness_endpoint_responds_without_database() {
    let router = test_router(FakeTransport::new());

    let request = Request::builder().uri("/live").body(Body::empty()).expect("request");
    let response = router.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-Request-Id"));
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let router = test_router(FakeTransport::new());

    let request = Request::builder().uri("/nope").body(Body::empty()).expect("request");
    let response = router.oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn enquiry_rejects_missing_fields() {
    let transport = FakeTransport::new();
    let router = test_router(transport.clone());

    let (status, body) = post_json(
        router,
        "/enquiry",
        serde_json::json!({ "email": "not-an-email" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().expect("errors array");
    assert!(errors.iter().any(|e| e == "Name is required"));
    assert!(errors.iter().any(|e| e == "Invalid email address"));
    assert!(errors.iter().any(|e| e == "Message is required"));
    assert_eq!(transport.attempts(), 0);
}

#[tokio::test]
async fn enquiry_sends_alert_with_reply_to() {
    let transport = FakeTransport::new();
    let router = test_router(transport.clone());

    let (status, body) = post_json(
        router,
        "/enquiry",
        serde_json::json!({
            "name": "Jo Bloggs",
            "category": "dental",
            "email": "jo@example.com",
            "phone": "07700900000",
            "message": "Do you take new patients?",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email sent successfully");

    let sent = transport.last_delivery().expect("alert sent");
    assert_eq!(sent.subject, "DENTAL Enquiry Form Submission");
    assert_eq!(sent.reply_to.as_deref(), Some("jo@example.com"));
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test]
async fn promotion_rejects_missing_fields() {
    let transport = FakeTransport::new();
    let router = test_router(transport.clone());

    let (status, body) = post_json(router, "/promotion", serde_json::json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().expect("errors array");
    assert!(errors.iter().any(|e| e == "Full name is required"));
    assert!(errors.iter().any(|e| e == "Phone number is required"));
    assert_eq!(transport.attempts(), 0);
}

#[tokio::test]
async fn refer_a_friend_rejects_missing_referrer() {
    let router = test_router(FakeTransport::new());

    let (status, body) = post_json(
        router,
        "/refer-a-friend",
        serde_json::json!({
            "full_name": "Jo Bloggs",
            "email": "jo@example.com",
            "phone": "07700900000",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().expect("errors array");
    assert!(errors.iter().any(|e| e == "Referrer name is required"));
}

#[tokio::test]
async fn partner_without_capture_url_returns_503() {
    let router = test_router(FakeTransport::new());

    let (status, body) = post_json(
        router,
        "/partner",
        serde_json::json!({
            "full_name": "Jo Bloggs",
            "email": "jo@example.com",
            "phone": "07700900000",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Partner forwarding is not configured.");
}

#[tokio::test]
async fn legacy_field_aliases_accepted() {
    let router = test_router(FakeTransport::new());

    // Original site form posts camelCase names; validation must see them.
    let (status, body) = post_json(
        router,
        "/refer-a-friend",
        serde_json::json!({
            "referrerName": "Sam Referrer",
            "fullname": "",
            "email": "jo@example.com",
            "phone": "07700900000",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["errors"].as_array().expect("errors array");
    assert!(errors.iter().any(|e| e == "Full name is required"));
    assert!(!errors.iter().any(|e| e == "Referrer name is required"));
}
