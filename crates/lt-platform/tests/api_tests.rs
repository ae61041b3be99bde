//! API Endpoint Tests
//!
//! Tests for:
//! - Registration and login
//! - Role-gated admin endpoints (API keys, metrics)
//! - API key lifecycle against the integration feed
//! - Request instrumentation of accepted, rejected and unmatched calls

use std::sync::Arc;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use lt_platform::api::{platform_router, AppState};
use lt_platform::repository::{InMemoryCredentialStore, InMemoryShipmentFeed, ShipmentFeed};
use lt_platform::service::{
    Argon2Config, AuthConfig, PasswordPolicy, PasswordService, TokenService,
};
use lt_platform::{DevDataSeeder, PlatformError, ShipmentSummary};

const SIGNING_KEY: &str = "integration-test-signing-key-0123456789";

/// Shipment feed whose backing store is down
struct UnavailableFeed;

#[async_trait]
impl ShipmentFeed for UnavailableFeed {
    async fn list_shipments(&self) -> lt_platform::error::Result<Vec<ShipmentSummary>> {
        Err(PlatformError::internal("shipments collection unreachable at 10.0.0.7"))
    }
}

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_feed(Arc::new(InMemoryShipmentFeed::with_shipments(vec![sample_shipment()]))).await
    }

    async fn with_feed(shipments: Arc<dyn ShipmentFeed>) -> Self {
        let store = Arc::new(InMemoryCredentialStore::new());
        let passwords = Arc::new(
            PasswordService::new(Argon2Config::minimal(), PasswordPolicy::default()).unwrap(),
        );
        let tokens = Arc::new(
            TokenService::new(AuthConfig {
                secret_key: SIGNING_KEY.to_string(),
                ..Default::default()
            })
            .unwrap(),
        );

        DevDataSeeder::new(store.clone(), passwords.clone(), &lt_config::SeedConfig::default())
            .run()
            .await
            .unwrap();

        let state = AppState::new(tokens, passwords, store.clone(), store, shipments);
        Self {
            router: platform_router(state.clone()),
            state,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn login(&self, login: &str, password: &str) -> String {
        let (status, body) = self
            .send(json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                json!({ "emailOrUserName": login, "password": password }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        self.login("admin", "Admin123!").await
    }

    async fn user_token(&self) -> String {
        self.login("user1", "User123!").await
    }
}

fn sample_shipment() -> ShipmentSummary {
    ShipmentSummary {
        id: "1".to_string(),
        reference: "SHP-0001".to_string(),
        status: "InTransit".to_string(),
        customer: Some("Acme".to_string()),
        vehicle: Some("KR 12345".to_string()),
        distance_km: 120.5,
        weight_kg: 800.0,
        price: Some(450.0),
        created_at: Utc::now(),
    }
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn get_with_key(uri: &str, key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(key) = key {
        builder = builder.header("X-API-Key", key);
    }
    builder.body(Body::empty()).unwrap()
}

fn patch(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(Method::PATCH)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_register_then_login_carries_user_role() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            json!({ "email": "a@b.com", "password": "Secret1", "role": "User" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "a@b.com");
    assert_eq!(body["userName"], "a@b.com");
    assert_eq!(body["roles"], json!(["User"]));

    let token = app.login("a@b.com", "Secret1").await;
    let claims = app.state.tokens.validate(&token).unwrap();
    assert_eq!(claims.role, vec!["User".to_string()]);
    assert_eq!(claims.email, "a@b.com");
}

#[tokio::test]
async fn test_register_weak_password_lists_errors() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            json!({ "email": "a@b.com", "password": "abc" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            json!({ "email": "admin@example.com", "password": "Secret1" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures_are_generic_401() {
    let app = TestApp::new().await;

    for (login, password) in [("admin", "wrong1"), ("nobody@example.com", "Admin123!")] {
        let (status, body) = app
            .send(json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                json!({ "emailOrUserName": login, "password": password }),
            ))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid credentials");
    }
}

#[tokio::test]
async fn test_me_returns_claims() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (status, body) = app.send(get("/api/v1/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unique_name"], "admin");
    assert_eq!(body["email"], "admin@example.com");
    assert_eq!(body["role"], json!(["Admin"]));
    assert_eq!(body["iss"], "logitrack");
    assert_eq!(body["aud"], "logitrack");

    let claims = app.state.tokens.validate(&token).unwrap();
    assert_eq!(body["sub"], claims.sub.as_str());
    assert_eq!(body["iat"], claims.iat);
    assert_eq!(body["exp"], claims.exp);
}

#[tokio::test]
async fn test_public_routes_ignore_presented_credentials() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/login",
            Some("not.a.token"),
            json!({ "emailOrUserName": "user1", "password": "User123!" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["roles"], json!(["User"]));
}

#[tokio::test]
async fn test_incomplete_register_body_is_validation_error() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/v1/auth/register",
            None,
            json!({ "email": "a@b.com" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().unwrap().contains("password"));
}

#[tokio::test]
async fn test_truncated_json_body_is_validation_error() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let truncated = |uri: &str, token: Option<&str>| {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(r#"{"email": "a@b.c"#)).unwrap()
    };

    for request in [
        truncated("/api/v1/auth/login", None),
        truncated("/api/v1/auth/register", None),
        truncated("/api/v1/admin/apikeys", Some(&token)),
    ] {
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_me_requires_credentials() {
    let app = TestApp::new().await;

    let response = app.router.clone().oneshot(get("/api/v1/auth/me", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get("www-authenticate").unwrap(), "Bearer");

    let (status, _) = app.send(get("/api/v1/auth/me", Some("not.a.token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_foreign_and_expired_tokens_look_the_same() {
    let app = TestApp::new().await;

    let forger = TokenService::new(AuthConfig {
        secret_key: "some-other-key-entirely-0123456789abcdef".to_string(),
        ..Default::default()
    })
    .unwrap();
    let admin = lt_platform::NewUser::new("admin@example.com", "x")
        .with_user_name("admin")
        .with_role("Admin")
        .into_identity("1");
    let forged = forger.issue(&admin).unwrap();

    let expired = app
        .state
        .tokens
        .issue_at(&admin, Utc::now() - chrono::Duration::hours(2))
        .unwrap();

    let (forged_status, forged_body) = app.send(get("/api/v1/admin/apikeys", Some(&forged))).await;
    let (expired_status, expired_body) = app.send(get("/api/v1/admin/apikeys", Some(&expired))).await;

    assert_eq!(forged_status, StatusCode::UNAUTHORIZED);
    assert_eq!(expired_status, StatusCode::UNAUTHORIZED);
    assert_eq!(forged_body, expired_body);
}

// ============================================================================
// Admin API keys
// ============================================================================

#[tokio::test]
async fn test_user_role_forbidden_on_admin_routes() {
    let app = TestApp::new().await;
    let token = app.user_token().await;

    let (status, body) = app.send(get("/api/v1/admin/apikeys", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    let (status, _) = app.send(get("/api/v1/metrics", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_routes_require_credentials() {
    let app = TestApp::new().await;

    let (status, _) = app.send(get("/api/v1/admin/apikeys", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(json_request(Method::POST, "/api/v1/admin/apikeys", None, json!({ "name": "x" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_rejects_blank_name() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .send(json_request(
            Method::POST,
            "/api/v1/admin/apikeys",
            Some(&token),
            json!({ "name": "   " }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Name is required");
}

#[tokio::test]
async fn test_list_never_exposes_secrets() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (_, created) = app
        .send(json_request(
            Method::POST,
            "/api/v1/admin/apikeys",
            Some(&token),
            json!({ "name": "  partner-x  " }),
        ))
        .await;
    let secret = created["apiKey"].as_str().unwrap();
    assert!(secret.starts_with("LT_API_"));
    assert_eq!(created["name"], "partner-x");
    assert_eq!(created["active"], true);

    let (status, listed) = app.send(get("/api/v1/admin/apikeys", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert!(listed[0].get("apiKey").is_none());
    assert!(!listed.to_string().contains(secret));
}

#[tokio::test]
async fn test_deactivate_twice_and_unknown_id() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (_, created) = app
        .send(json_request(
            Method::POST,
            "/api/v1/admin/apikeys",
            Some(&token),
            json!({ "name": "partner-y" }),
        ))
        .await;
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/admin/apikeys/{}/deactivate", id);

    let (first, _) = app.send(patch(&uri, &token)).await;
    let (second, body) = app.send(patch(&uri, &token)).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body["message"], "API key deactivated.");

    let (_, listed) = app.send(get("/api/v1/admin/apikeys", Some(&token))).await;
    assert_eq!(listed[0]["active"], false);

    let (status, _) = app.send(patch("/api/v1/admin/apikeys/999/deactivate", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, listed) = app.send(get("/api/v1/admin/apikeys", Some(&token))).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

// ============================================================================
// Integration feed
// ============================================================================

#[tokio::test]
async fn test_partner_key_lifecycle() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (_, created) = app
        .send(json_request(
            Method::POST,
            "/api/v1/admin/apikeys",
            Some(&token),
            json!({ "name": "partner-x" }),
        ))
        .await;
    assert_eq!(created["active"], true);
    let secret = created["apiKey"].as_str().unwrap().to_string();
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(get_with_key("/api/v1/integration/shipments", Some(&secret)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["integrationKeyName"], "partner-x");
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["reference"], "SHP-0001");

    let (status, _) = app
        .send(patch(&format!("/api/v1/admin/apikeys/{}/deactivate", id), &token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(get_with_key("/api/v1/integration/shipments", Some(&secret)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_integration_rejects_missing_and_bearer_credentials() {
    let app = TestApp::new().await;

    let (status, _) = app.send(get_with_key("/api/v1/integration/shipments", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(get_with_key("/api/v1/integration/shipments", Some("LT_API_unknown")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // A valid session token is not an integration credential
    let token = app.admin_token().await;
    let (status, _) = app.send(get("/api/v1/integration/shipments", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_store_failure_is_generic_500() {
    let app = TestApp::with_feed(Arc::new(UnavailableFeed)).await;
    let record = app.state.api_keys.create("partner-z").await.unwrap();

    let (status, body) = app
        .send(get_with_key("/api/v1/integration/shipments", Some(&record.key)))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");
    assert!(!body.to_string().contains("10.0.0.7"));
}

// ============================================================================
// Metrics
// ============================================================================

#[tokio::test]
async fn test_metrics_count_rejected_and_unmatched_requests() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    app.send(get("/api/v1/admin/apikeys", None)).await;
    app.send(get_with_key("/api/v1/integration/shipments", None)).await;
    app.send(get("/api/v1/nowhere", None)).await;

    let (status, body) = app.send(get("/api/v1/metrics", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    // login + three calls above; the metrics call itself is recorded after the snapshot
    assert_eq!(body["totalRequests"], 4);

    let per_endpoint = body["perEndpoint"].as_array().unwrap();
    let names: Vec<&str> = per_endpoint.iter().map(|e| e["endpoint"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["AdminApiKeys", "Auth", "IntegrationShipments", "UnknownController"]);
    for entry in per_endpoint {
        assert_eq!(entry["count"], 1);
    }

    assert_eq!(app.state.metrics.total_requests(), 5);
    assert_eq!(app.state.metrics.endpoint_count("Metrics"), 1);
}

#[tokio::test]
async fn test_metrics_average_is_rounded() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let (_, body) = app.send(get("/api/v1/metrics", Some(&token))).await;
    let average = body["averageResponseTimeMs"].as_f64().unwrap();
    assert!(average >= 0.0);
    assert_eq!((average * 100.0).round() / 100.0, average);
}
