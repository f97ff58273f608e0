//! Route table, generalized from the teacher's `router::api_router`: one
//! `Router<AppState>`, request-id middleware and `TraceLayer` applied once
//! at the bottom.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin_apis, admin_clients, admin_internal, health, token, tokens};
use crate::middleware::request_id_middleware;
use crate::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/oauth/token", post(token::issue_token))
        .route(
            "/v1/internal.createWorkspace",
            post(admin_internal::create_workspace),
        )
        .route(
            "/v1/internal.createRootClient",
            post(admin_internal::create_root_client),
        )
        .route("/v1/apis.createApi", post(admin_apis::create_api))
        .route("/v1/clients.createClient", post(admin_clients::create_client))
        .route("/v1/clients.getClient", get(admin_clients::get_client))
        .route("/v1/clients.rotateSecret", post(admin_clients::rotate_secret))
        .route("/v1/tokens.verifyToken", post(tokens::verify_token))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
}
