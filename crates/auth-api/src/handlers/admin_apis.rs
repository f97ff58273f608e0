//! `/v1/apis.createApi` — gated by `RootPrincipal`; the created API belongs
//! to the caller's `for_workspace_id`, never a workspace supplied in the body.

use axum::extract::{Extension, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use auth_core::error::AuthError;
use auth_core::models::{Api, ApiScope};
use auth_core::services::store::NewApiScope;

use crate::error::{ApiError, TagRequestId};
use crate::extractors::RootPrincipal;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NewScopeRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateApiRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub scopes: Option<Vec<NewScopeRequest>>,
}

#[derive(Debug, Serialize)]
pub struct ApiWithScopesResponse {
    #[serde(flatten)]
    pub api: Api,
    pub scopes: Vec<ApiScope>,
}

pub async fn create_api(
    State(state): State<AppState>,
    Extension(request_id): Extension<String>,
    principal: RootPrincipal,
    Json(body): Json<CreateApiRequest>,
) -> Result<Json<ApiWithScopesResponse>, ApiError> {
    body.validate().tag(&request_id)?;

    // `RootPrincipal` already asserts `for_workspace_id.is_some()`; the
    // `ok_or` here just keeps the type honest without an `.unwrap()`.
    let workspace_id = principal
        .client
        .for_workspace_id
        .clone()
        .ok_or(AuthError::Forbidden {
            reason: "caller is not a root client".to_string(),
        })
        .tag(&request_id)?;

    let scopes = body.scopes.unwrap_or_default();
    if scopes.iter().any(|s| s.name.trim().is_empty()) {
        let err: ApiError = AuthError::ValidationError {
            message: "scope name must not be empty".to_string(),
        }
        .into();
        return Err(err.with_request_id(request_id));
    }

    let scopes = scopes
        .into_iter()
        .map(|s| NewApiScope {
            name: s.name,
            description: s.description,
        })
        .collect();

    let (api, scopes) = state
        .admin
        .create_api(&principal.client.id, &workspace_id, &body.name, scopes)
        .await
        .tag(&request_id)?;

    Ok(Json(ApiWithScopesResponse { api, scopes }))
}
