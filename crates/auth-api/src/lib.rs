//! HTTP layer for the authorization service: the route table, `AppState`,
//! error-to-HTTP mapping, and the authorizer extractors. Generalized from
//! the teacher's `auth-api` crate split (`lib.rs` wires `AppState` and
//! `app()`, `router.rs` owns the route table, `handlers/` one module per
//! resource) — this crate carries no admin UI and no OpenAPI emitter, both
//! out of scope per spec.md §1.

use axum::Router;
use std::sync::Arc;

use auth_core::services::{AdminService, Authorizer, TokenIssuer};

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;

#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<Authorizer>,
    pub issuer: Arc<TokenIssuer>,
    pub admin: Arc<AdminService>,
    /// Workspace and API the internal surface provisions root clients
    /// into — configured out of band, not supplied by request bodies.
    pub internal_workspace_id: String,
    pub internal_api_id: String,
}

pub fn app(state: AppState) -> Router {
    router::api_router().with_state(state)
}
