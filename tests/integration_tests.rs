//! End-to-end lifecycle: internal bootstrap, workspace/API/client
//! provisioning, token issuance, verification, and secret rotation, all
//! driven through the HTTP router with an in-memory store and an
//! in-process pub/sub broker standing in for Redis.

use std::sync::Arc;

use auth_api::AppState;
use auth_cache::{ClientCache, InMemoryPubSub, Publisher};
use auth_core::models::Client;
use auth_core::services::{AdminService, Authorizer, BucketRegistry, Store, TokenIssuer};
use auth_crypto::JwtCodec;
use auth_db::InMemoryStore;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::util::ServiceExt;

struct Harness {
    state: AppState,
}

impl Harness {
    async fn new() -> (Self, String, String) {
        let store = Arc::new(InMemoryStore::new());
        let jwt = Arc::new(JwtCodec::new("integration-test-signing-secret", 86_400));
        let pubsub = InMemoryPubSub::new();
        let publisher: Arc<dyn Publisher> = Arc::new(pubsub);

        let root_workspace = store.create_workspace("root").await.unwrap();
        let (root_api, _) = store.create_api(&root_workspace.id, "internal", vec![]).await.unwrap();
        let (internal_client, internal_secret) = store
            .create_basic_client(&root_workspace.id, "internal", &root_api.id, None)
            .await
            .unwrap();

        let authorizer = Arc::new(Authorizer::new(
            Arc::clone(&jwt),
            store.clone() as Arc<dyn auth_core::services::Store>,
            ClientCache::<Client>::new(),
            BucketRegistry::new(),
            internal_client.id.clone(),
        ));
        let issuer = Arc::new(TokenIssuer::new(Arc::clone(&jwt), store.clone() as Arc<dyn auth_core::services::Store>));
        let admin = Arc::new(AdminService::new(
            store.clone() as Arc<dyn auth_core::services::Store>,
            publisher,
            "clients".to_string(),
        ));

        let state = AppState {
            authorizer,
            issuer,
            admin,
            internal_workspace_id: root_workspace.id.clone(),
            internal_api_id: root_api.id.clone(),
        };

        (Self { state }, internal_client.id, internal_secret)
    }

    async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = auth_api::app(self.state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn issue_token(&self, client_id: &str, client_secret: &str) -> String {
        let form = format!(
            "grant_type=client_credentials&client_id={client_id}&client_secret={client_secret}"
        );
        let req = Request::builder()
            .method("POST")
            .uri("/oauth/token")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        let (status, body) = self.call(req).await;
        assert_eq!(status, StatusCode::OK, "token issuance failed: {body:?}");
        body["access_token"].as_str().unwrap().to_string()
    }

    fn bearer(token: &str, req: axum::http::request::Builder) -> axum::http::request::Builder {
        req.header("authorization", format!("Bearer {token}"))
    }
}

#[tokio::test]
async fn full_client_credentials_lifecycle() {
    let (harness, internal_client_id, internal_secret) = Harness::new().await;

    let internal_token = harness.issue_token(&internal_client_id, &internal_secret).await;

    let req = Harness::bearer(
        &internal_token,
        Request::builder().method("POST").uri("/v1/internal.createWorkspace"),
    )
    .header("content-type", "application/json")
    .body(Body::from(serde_json::to_vec(&json!({ "name": "acme" })).unwrap()))
    .unwrap();
    let (status, workspace_body) = harness.call(req).await;
    assert_eq!(status, StatusCode::OK);
    let tenant_workspace_id = workspace_body["id"].as_str().unwrap().to_string();

    let req = Harness::bearer(
        &internal_token,
        Request::builder().method("POST").uri("/v1/internal.createRootClient"),
    )
    .header("content-type", "application/json")
    .body(
        Body::from(
            serde_json::to_vec(&json!({ "name": "acme-root", "for_workspace_id": tenant_workspace_id }))
                .unwrap(),
        ),
    )
    .unwrap();
    let (status, root_body) = harness.call(req).await;
    assert_eq!(status, StatusCode::OK);
    let root_client_id = root_body["id"].as_str().unwrap().to_string();
    let root_secret = root_body["client_secret"].as_str().unwrap().to_string();

    let root_token = harness.issue_token(&root_client_id, &root_secret).await;

    let req = Harness::bearer(
        &root_token,
        Request::builder().method("POST").uri("/v1/apis.createApi"),
    )
    .header("content-type", "application/json")
    .body(Body::from(serde_json::to_vec(&json!({ "name": "billing" })).unwrap()))
    .unwrap();
    let (status, api_body) = harness.call(req).await;
    assert_eq!(status, StatusCode::OK);
    let api_id = api_body["id"].as_str().unwrap().to_string();

    let req = Harness::bearer(
        &root_token,
        Request::builder().method("POST").uri("/v1/clients.createClient"),
    )
    .header("content-type", "application/json")
    .body(
        Body::from(serde_json::to_vec(&json!({ "name": "worker-1", "api_id": api_id })).unwrap()),
    )
    .unwrap();
    let (status, client_body) = harness.call(req).await;
    assert_eq!(status, StatusCode::OK);
    let worker_id = client_body["id"].as_str().unwrap().to_string();
    let worker_secret = client_body["client_secret"].as_str().unwrap().to_string();

    let worker_token = harness.issue_token(&worker_id, &worker_secret).await;

    let req = Harness::bearer(
        &worker_token,
        Request::builder().method("POST").uri("/v1/tokens.verifyToken"),
    )
    .body(Body::empty())
    .unwrap();
    let (status, verify_body) = harness.call(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verify_body["valid"], json!(true));

    let req = Harness::bearer(
        &root_token,
        Request::builder().method("POST").uri("/v1/clients.rotateSecret"),
    )
    .header("content-type", "application/json")
    .body(Body::from(serde_json::to_vec(&json!({ "client_id": worker_id })).unwrap()))
    .unwrap();
    let (status, rotate_body) = harness.call(req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!rotate_body["client_secret"].as_str().unwrap().is_empty());

    let req = Harness::bearer(
        &worker_token,
        Request::builder().method("POST").uri("/v1/tokens.verifyToken"),
    )
    .body(Body::empty())
    .unwrap();
    let (status, verify_body) = harness.call(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verify_body["valid"], json!(false));
    assert_eq!(verify_body["reason"], json!("VERSION_MISMATCH"));
}

#[tokio::test]
async fn root_client_cannot_reach_into_another_workspace() {
    let (harness, internal_client_id, internal_secret) = Harness::new().await;
    let internal_token = harness.issue_token(&internal_client_id, &internal_secret).await;

    async fn provision_workspace(harness: &Harness, internal_token: &str, name: &str) -> (String, String) {
        let req = Harness::bearer(
            internal_token,
            Request::builder().method("POST").uri("/v1/internal.createWorkspace"),
        )
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&json!({ "name": name })).unwrap()))
        .unwrap();
        let (_, workspace_body) = harness.call(req).await;
        let workspace_id = workspace_body["id"].as_str().unwrap().to_string();

        let req = Harness::bearer(
            internal_token,
            Request::builder().method("POST").uri("/v1/internal.createRootClient"),
        )
        .header("content-type", "application/json")
        .body(
            Body::from(
                serde_json::to_vec(&json!({ "name": format!("{name}-root"), "for_workspace_id": workspace_id }))
                    .unwrap(),
            ),
        )
        .unwrap();
        let (_, root_body) = harness.call(req).await;
        let root_client_id = root_body["id"].as_str().unwrap().to_string();
        let root_secret = root_body["client_secret"].as_str().unwrap().to_string();
        let token = harness.issue_token(&root_client_id, &root_secret).await;
        (workspace_id, token)
    }

    let (_ws_a, token_a) = provision_workspace(&harness, &internal_token, "workspace-a").await;
    let (_ws_b, token_b) = provision_workspace(&harness, &internal_token, "workspace-b").await;

    let req = Harness::bearer(
        &token_a,
        Request::builder().method("POST").uri("/v1/apis.createApi"),
    )
    .header("content-type", "application/json")
    .body(Body::from(serde_json::to_vec(&json!({ "name": "billing" })).unwrap()))
    .unwrap();
    let (_, api_body) = harness.call(req).await;
    let api_id = api_body["id"].as_str().unwrap().to_string();

    let req = Harness::bearer(
        &token_a,
        Request::builder().method("POST").uri("/v1/clients.createClient"),
    )
    .header("content-type", "application/json")
    .body(Body::from(serde_json::to_vec(&json!({ "name": "worker", "api_id": api_id })).unwrap()))
    .unwrap();
    let (_, client_body) = harness.call(req).await;
    let client_id = client_body["id"].as_str().unwrap().to_string();

    let req = Harness::bearer(
        &token_b,
        Request::builder()
            .method("GET")
            .uri(format!("/v1/clients.getClient?client_id={client_id}")),
    )
    .body(Body::empty())
    .unwrap();
    let (status, _) = harness.call(req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
