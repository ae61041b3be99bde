//! Integration API
//!
//! Read-only shipment feed for machine callers holding an `X-API-Key`.

use axum::{extract::State, middleware, routing::get, Json, Router};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::domain::ShipmentSummary;
use crate::error::PlatformError;
use crate::service::RoutePolicy;
use super::common::endpoints;
use super::instrumentation::tag_endpoint;
use super::middleware::{enforce_policy, AppState, GateState, IntegrationCaller};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationShipmentsResponse {
    /// Name of the key that made the call
    pub integration_key_name: String,
    pub count: usize,
    pub data: Vec<ShipmentSummary>,
}

/// List shipments for an integration partner
#[utoipa::path(
    get,
    path = "/api/v1/integration/shipments",
    tag = "integration",
    responses(
        (status = 200, description = "Shipment feed", body = IntegrationShipmentsResponse),
        (status = 401, description = "Missing, unknown or inactive API key")
    ),
    security(("api_key" = []))
)]
pub async fn list_integration_shipments(
    State(state): State<AppState>,
    IntegrationCaller(caller): IntegrationCaller,
) -> Result<Json<IntegrationShipmentsResponse>, PlatformError> {
    let data = state.shipments.list_shipments().await?;
    debug!(api_key_id = %caller.key_id, count = data.len(), "Integration shipments served");

    Ok(Json(IntegrationShipmentsResponse {
        integration_key_name: caller.name,
        count: data.len(),
        data,
    }))
}

pub fn integration_router(state: AppState) -> Router {
    Router::new()
        .route("/shipments", get(list_integration_shipments))
        .route_layer(middleware::from_fn_with_state(
            GateState::new(&state, RoutePolicy::ApiKey),
            enforce_policy,
        ))
        .route_layer(middleware::from_fn_with_state(
            endpoints::INTEGRATION_SHIPMENTS,
            tag_endpoint,
        ))
        .with_state(state)
}
