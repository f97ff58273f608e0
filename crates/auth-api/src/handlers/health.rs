use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Readiness is not distinguished from liveness here: the pool and pub/sub
/// subscriber are both established before the server starts accepting
/// connections, so once this handler is reachable both are live.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
