mod common;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use crafters_market::build_app;
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use common::{MemoryGateway, state_with, test_config};

/// Router over a pool that never connects, for requests rejected before any query.
fn offline_app() -> Router {
    let url = "postgres://postgres@127.0.0.1:1/offline";
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy(url)
        .unwrap();
    let mut state = state_with(pool, test_config(url), Arc::new(MemoryGateway::default()));
    state.embeddings = None;
    build_app(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_degraded_dependencies() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(offline_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Health check");
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "unavailable");
    assert_eq!(body["data"]["semantic_search"], false);
}

#[tokio::test]
async fn unknown_paths_fall_through_to_not_found() {
    let request = Request::builder()
        .uri("/api/does-not-exist")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(offline_app(), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["data"]["path"], "/api/does-not-exist");
}

#[tokio::test]
async fn admin_routes_require_a_session() {
    let request = Request::builder()
        .uri("/api/admin/crafters/pending")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(offline_app(), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn checkout_rejects_an_empty_cart() {
    let request = json_post(
        "/api/checkout/payment-intent",
        serde_json::json!({
            "items": [],
            "customer_email": "buyer@example.com",
            "customer_name": "Buyer"
        }),
    );
    let (status, body) = send(offline_app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cart items are required");
}

#[tokio::test]
async fn webhook_requires_signature_headers() {
    let request = json_post(
        "/api/webhooks/identity",
        serde_json::json!({ "type": "user.created", "data": { "id": "user_1" } }),
    );
    let (status, body) = send(offline_app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing webhook signature headers");
}

#[tokio::test]
async fn semantic_search_is_unavailable_without_a_provider() {
    let request = json_post(
        "/api/search/semantic",
        serde_json::json!({ "query": "a mug for tea" }),
    );
    let (status, body) = send(offline_app(), request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Semantic search is not configured");
}
