//! Admin API Keys
//!
//! Issue, list and deactivate integration keys. Admin role only.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    middleware,
    routing::{get, patch},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{ApiKeyInfo, ApiKeyRecord};
use crate::error::PlatformError;
use crate::service::RoutePolicy;
use super::common::{endpoints, extract_json};
use super::instrumentation::tag_endpoint;
use super::middleware::{enforce_policy, AppState, Authenticated, GateState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateApiKeyRequest {
    #[serde(default)]
    pub name: String,
}

/// Returned once, at creation. The secret cannot be retrieved again.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyResponse {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub api_key: String,
}

impl From<ApiKeyRecord> for CreateApiKeyResponse {
    fn from(record: ApiKeyRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            active: record.active,
            created_at: record.created_at,
            api_key: record.key,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// List API keys
#[utoipa::path(
    get,
    path = "/api/v1/admin/apikeys",
    tag = "admin-api-keys",
    responses(
        (status = 200, description = "All keys, secrets omitted", body = Vec<ApiKeyInfo>),
        (status = 401, description = "Missing or invalid credentials"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_api_keys(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
) -> Result<Json<Vec<ApiKeyInfo>>, PlatformError> {
    let keys = state.api_keys.list().await?;
    info!(user_id = %ctx.user_id, count = keys.len(), "API keys listed");
    Ok(Json(keys))
}

/// Create API key
#[utoipa::path(
    post,
    path = "/api/v1/admin/apikeys",
    tag = "admin-api-keys",
    request_body = CreateApiKeyRequest,
    responses(
        (status = 200, description = "Key created; secret shown once", body = CreateApiKeyResponse),
        (status = 400, description = "Name is required"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_api_key(
    State(state): State<AppState>,
    Authenticated(ctx): Authenticated,
    body: Result<Json<CreateApiKeyRequest>, JsonRejection>,
) -> Result<Json<CreateApiKeyResponse>, PlatformError> {
    let req = extract_json(body)?;
    let record = state.api_keys.create(&req.name).await?;
    info!(user_id = %ctx.user_id, api_key_id = %record.id, "API key issued by admin");
    Ok(Json(record.into()))
}

/// Deactivate API key
///
/// Idempotent: deactivating an inactive key succeeds.
#[utoipa::path(
    patch,
    path = "/api/v1/admin/apikeys/{id}/deactivate",
    tag = "admin-api-keys",
    params(
        ("id" = String, Path, description = "API key ID")
    ),
    responses(
        (status = 200, description = "Key deactivated", body = MessageResponse),
        (status = 404, description = "API key not found"),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn deactivate_api_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, PlatformError> {
    state.api_keys.deactivate(&id).await?;
    Ok(Json(MessageResponse {
        message: "API key deactivated.".to_string(),
    }))
}

pub fn api_keys_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_api_keys).post(create_api_key))
        .route("/:id/deactivate", patch(deactivate_api_key))
        .route_layer(middleware::from_fn_with_state(
            GateState::new(&state, RoutePolicy::admin()),
            enforce_policy,
        ))
        .route_layer(middleware::from_fn_with_state(endpoints::ADMIN_API_KEYS, tag_endpoint))
        .with_state(state)
}
