//! Focused HTTP-level checks for the token endpoints that don't need the
//! full provisioning lifecycle: wrong secret, expired token, rate limiting,
//! and verification of a missing/malformed bearer header.

use std::sync::Arc;

use auth_api::AppState;
use auth_cache::{ClientCache, InMemoryPubSub, Publisher};
use auth_core::models::Client;
use auth_core::services::store::RateLimitConfig;
use auth_core::services::{AdminService, Authorizer, BucketRegistry, Store, TokenIssuer};
use auth_crypto::JwtCodec;
use auth_db::InMemoryStore;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::util::ServiceExt;

async fn call(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
    let response = auth_api::app(state.clone()).oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn test_state(rate_limit: Option<RateLimitConfig>) -> (AppState, String, String) {
    let store = Arc::new(InMemoryStore::new());
    let jwt = Arc::new(JwtCodec::new("api-mock-test-signing-secret", 86_400));
    let pubsub = InMemoryPubSub::new();
    let publisher: Arc<dyn Publisher> = Arc::new(pubsub);

    let workspace = store.create_workspace("acme").await.unwrap();
    let (api, _) = store.create_api(&workspace.id, "billing", vec![]).await.unwrap();
    let (client, secret) = store
        .create_basic_client(&workspace.id, "worker-1", &api.id, rate_limit)
        .await
        .unwrap();

    let store: Arc<dyn Store> = store;
    let authorizer = Arc::new(Authorizer::new(
        Arc::clone(&jwt),
        Arc::clone(&store),
        ClientCache::<Client>::new(),
        BucketRegistry::new(),
        "cli_internal_unused".to_string(),
    ));
    let issuer = Arc::new(TokenIssuer::new(Arc::clone(&jwt), Arc::clone(&store)));
    let admin = Arc::new(AdminService::new(store, publisher, "clients".to_string()));

    let state = AppState {
        authorizer,
        issuer,
        admin,
        internal_workspace_id: workspace.id.clone(),
        internal_api_id: api.id.clone(),
    };
    (state, client.id, secret)
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (state, _, _) = test_state(None).await;
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, _) = call(&state, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn token_issuance_rejects_the_wrong_secret() {
    let (state, client_id, _correct_secret) = test_state(None).await;

    let form = format!("grant_type=client_credentials&client_id={client_id}&client_secret=not-the-right-one");
    let req = Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let (status, _) = call(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_issuance_accepts_http_basic_credentials() {
    let (state, client_id, secret) = test_state(None).await;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    let encoded = STANDARD.encode(format!("{client_id}:{secret}"));

    let req = Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header("authorization", format!("Basic {encoded}"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("grant_type=client_credentials"))
        .unwrap();
    let (status, body) = call(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].as_str().is_some());
}

#[tokio::test]
async fn verify_token_reports_an_expired_token() {
    let (state, client_id, secret) = test_state(None).await;
    let _ = secret;

    // A freshly created client always starts at version 1.
    let expired_jwt = JwtCodec::new("api-mock-test-signing-secret", -60);
    let token = expired_jwt.issue(&client_id, 1, None).unwrap();

    let req = Request::builder()
        .method("POST")
        .uri("/v1/tokens.verifyToken")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(false));
    assert_eq!(body["reason"], json!("EXPIRED"));
}

#[tokio::test]
async fn verify_token_reports_bad_jwt_for_a_missing_bearer_header() {
    let (state, _client_id, _secret) = test_state(None).await;

    let req = Request::builder()
        .method("POST")
        .uri("/v1/tokens.verifyToken")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(false));
    assert_eq!(body["reason"], json!("BAD_JWT"));
}

#[tokio::test]
async fn verify_token_enforces_a_configured_rate_limit() {
    let rate_limit = RateLimitConfig {
        bucket_size: 1,
        refill_amount: 1,
        refill_interval_ms: 60_000,
    };
    let (state, client_id, secret) = test_state(Some(rate_limit)).await;

    let form = format!("grant_type=client_credentials&client_id={client_id}&client_secret={secret}");
    let req = Request::builder()
        .method("POST")
        .uri("/oauth/token")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    let (_, body) = call(&state, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let verify = |token: String| {
        Request::builder()
            .method("POST")
            .uri("/v1/tokens.verifyToken")
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    let (status, first) = call(&state, verify(token.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["valid"], json!(true));

    let (status, second) = call(&state, verify(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["valid"], json!(false));
    assert_eq!(second["reason"], json!("RATE_LIMIT_EXCEEDED"));
}
