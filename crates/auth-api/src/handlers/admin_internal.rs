//! `/v1/internal.createWorkspace` and `/v1/internal.createRootClient` —
//! gated by `InternalPrincipal`. Grounded in the teacher's
//! `handlers::users::ban_user` shape (`State` + extractor + `Json` body,
//! service call, `Json` response) generalized to this service's
//! workspace/root-client provisioning operations.

use axum::extract::{Extension, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use auth_core::models::{Client, Workspace};

use crate::error::{ApiError, TagRequestId};
use crate::extractors::InternalPrincipal;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkspaceRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
}

pub async fn create_workspace(
    State(state): State<AppState>,
    Extension(request_id): Extension<String>,
    _principal: InternalPrincipal,
    Json(body): Json<CreateWorkspaceRequest>,
) -> Result<Json<Workspace>, ApiError> {
    body.validate().tag(&request_id)?;
    let workspace = state.admin.create_workspace(&body.name).await.tag(&request_id)?;
    Ok(Json(workspace))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRootClientRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "for_workspace_id must not be empty"))]
    pub for_workspace_id: String,
}

/// `ClientCreateResult`: the client row plus its plaintext secret, returned
/// exactly once — no later read exposes it again.
#[derive(Debug, Serialize)]
pub struct ClientCreateResponse {
    #[serde(flatten)]
    pub client: Client,
    pub client_secret: String,
}

pub async fn create_root_client(
    State(state): State<AppState>,
    Extension(request_id): Extension<String>,
    principal: InternalPrincipal,
    Json(body): Json<CreateRootClientRequest>,
) -> Result<Json<ClientCreateResponse>, ApiError> {
    body.validate().tag(&request_id)?;

    let (client, secret) = state
        .admin
        .create_root_client(
            &principal.0.sub,
            &state.internal_workspace_id,
            &body.for_workspace_id,
            &body.name,
            &state.internal_api_id,
        )
        .await
        .tag(&request_id)?;

    Ok(Json(ClientCreateResponse {
        client,
        client_secret: secret,
    }))
}
