//! Integration tests for API endpoints.
//!
//! The router runs against real services over an in-memory SQLite database.

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::setup_db;
use crud_template::api::{create_router, AppState};
use crud_template::config::Config;
use crud_template::errors::GENERIC_ERROR_MESSAGE;
use crud_template::infra::Database;
use crud_template::services::Claims;

const SECRET: &str = "integration-test-secret-at-least-32-chars";
const ISSUER: &str = "test-issuer";
const AUDIENCE: &str = "test-audience";

async fn app(environment: &str) -> Router {
    let config = Config::builder()
        .environment(environment)
        .jwt(ISSUER, AUDIENCE, SECRET)
        .build()
        .unwrap();
    let db = setup_db().await;
    create_router(AppState::from_config(
        Arc::new(Database::from_connection(db)),
        config,
    ))
}

fn token(name: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        name: Some(name.to_string()),
        iss: ISSUER.to_string(),
        aud: AUDIENCE.to_string(),
        exp: now + 3600,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token("alice")));

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn test_health_check() {
    let app = app("development").await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["services"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized_with_trace_id() {
    let app = app("development").await;
    let request = Request::builder()
        .uri("/v1/categories")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["x-request-id"], "req-123");

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["traceId"], "req-123");
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn test_crud_round() {
    let app = app("development").await;

    let (status, created) = send(
        &app,
        authed(
            "POST",
            "/v1/categories",
            Some(json!({ "name": "Tea", "otherName": "Chai" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Tea");
    assert_eq!(created["version"], 1);
    let id = created["id"].as_i64().unwrap();

    let (status, list) = send(&app, authed("GET", "/v1/categories?take=5", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["totalResults"], 1);
    assert_eq!(list["take"], 5);
    assert_eq!(list["items"][0]["otherName"], "Chai");

    let (status, updated) = send(
        &app,
        authed(
            "PUT",
            &format!("/v1/categories/{}", id),
            Some(json!({ "name": "Tea", "otherName": "Green", "version": 1 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["otherName"], "Green");
    assert_eq!(updated["version"], 2);

    let (status, _) = send(&app, authed("DELETE", &format!("/v1/categories/{}", id), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, authed("GET", &format!("/v1/categories/{}", id), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["errorDetails"]["Id"].is_array());
}

#[tokio::test]
async fn test_stale_version_is_conflict() {
    let app = app("development").await;
    let (_, created) = send(
        &app,
        authed(
            "POST",
            "/v1/categories",
            Some(json!({ "name": "Tea", "otherName": "Chai" })),
        ),
    )
    .await;
    let uri = format!("/v1/categories/{}", created["id"]);

    let (status, _) = send(
        &app,
        authed("PUT", &uri, Some(json!({ "name": "Tea", "otherName": "A", "version": 1 }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        authed("PUT", &uri, Some(json!({ "name": "Tea", "otherName": "B", "version": 1 }))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["errorDetails"]["version"].is_array());
}

#[tokio::test]
async fn test_invalid_order_by_lists_allowed_names() {
    let app = app("development").await;
    let (status, body) = send(&app, authed("GET", "/v1/categories?orderBy=invalidcol", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["errorDetails"]["orderBy"][0],
        "invalidcol: is/are invalid column(s) to order by. \
         Please use one of these properties: Name, OtherName"
    );
}

#[tokio::test]
async fn test_skip_take_overflow_is_rejected() {
    let app = app("development").await;
    let (status, body) = send(
        &app,
        authed("GET", "/v1/categories?skip=2147483647&take=1", None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errorDetails"]["skip"].is_array());
}

#[tokio::test]
async fn test_non_positive_id_is_not_found() {
    let app = app("development").await;
    let (status, _) = send(&app, authed("GET", "/v1/categories/0", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_name_is_invalid_model() {
    let app = app("development").await;
    let (status, body) = send(
        &app,
        authed(
            "POST",
            "/v1/categories",
            Some(json!({ "name": "", "otherName": "Chai" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorDetails"]["Name"][0], "Name can not be empty.");
}

#[tokio::test]
async fn test_production_hides_message() {
    let app = app("production").await;
    let (status, body) = send(&app, authed("GET", "/v1/categories/999", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], GENERIC_ERROR_MESSAGE);
    assert_eq!(body["stackTrace"], "");
    assert!(!body["traceId"].as_str().unwrap().is_empty());
    assert!(body["errorDetails"]["Id"].is_array());
}

#[tokio::test]
async fn test_generated_request_id_matches_trace_id() {
    let app = app("development").await;
    let response = app
        .clone()
        .oneshot(authed("GET", "/v1/categories/999", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let header = response.headers()["x-request-id"]
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(header.len(), 36);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["traceId"], header.as_str());
}
