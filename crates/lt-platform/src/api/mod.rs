//! API Layer
//!
//! REST endpoints for the platform, all under `/api/v1`. Every router
//! carries its own access policy; [`platform_router`] adds request
//! instrumentation around all of them.

pub mod common;
pub mod instrumentation;
pub mod middleware;

pub mod api_keys;
pub mod auth;
pub mod integration;
pub mod metrics;
pub mod openapi;

use axum::Router;

pub use common::*;
pub use instrumentation::{instrument_requests, tag_endpoint, CallerLabel, EndpointSlot};
pub use middleware::{
    authenticate_session, enforce_policy, AppState, Authenticated, GateState, IntegrationCaller,
    IntegrationKey,
};

pub use api_keys::api_keys_router;
pub use auth::auth_router;
pub use integration::integration_router;
pub use metrics::metrics_router;
pub use openapi::PlatformApiDoc;

/// All platform routes with instrumentation as the outermost layer, so
/// gate rejections and unmatched paths are measured too.
pub fn platform_router(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    let api = Router::new()
        .nest("/auth", auth_router(state.clone()))
        .nest("/admin/apikeys", api_keys_router(state.clone()))
        .nest("/integration", integration_router(state.clone()))
        .nest("/metrics", metrics_router(state));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(axum::middleware::from_fn_with_state(metrics, instrument_requests))
}
