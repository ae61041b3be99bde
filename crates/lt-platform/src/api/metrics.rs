//! Metrics API
//!
//! Admin view of the in-process request counters.

use axum::{extract::State, middleware, routing::get, Json, Router};

use crate::service::{MetricsSnapshot, RoutePolicy};
use super::common::endpoints;
use super::instrumentation::tag_endpoint;
use super::middleware::{enforce_policy, AppState, GateState};

/// Request statistics since process start
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    tag = "metrics",
    responses(
        (status = 200, description = "Request statistics", body = MetricsSnapshot),
        (status = 403, description = "Admin role required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

pub fn metrics_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_metrics))
        .route_layer(middleware::from_fn_with_state(
            GateState::new(&state, RoutePolicy::admin()),
            enforce_policy,
        ))
        .route_layer(middleware::from_fn_with_state(endpoints::METRICS, tag_endpoint))
        .with_state(state)
}
