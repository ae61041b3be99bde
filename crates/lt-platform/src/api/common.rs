//! Common API types and utilities

use axum::{extract::rejection::JsonRejection, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::PlatformError;

/// Standard API error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Endpoint group names reported in request metrics
pub mod endpoints {
    pub const AUTH: &str = "Auth";
    pub const ADMIN_API_KEYS: &str = "AdminApiKeys";
    pub const INTEGRATION_SHIPMENTS: &str = "IntegrationShipments";
    pub const METRICS: &str = "Metrics";
}

/// All platform routes live under this prefix.
pub const API_PREFIX: &str = "/api/v1";

/// Unwrap a JSON body, turning syntax, missing-field and content-type
/// rejections into a 400 validation error.
///
/// ```ignore
/// async fn handler(body: Result<Json<T>, JsonRejection>) -> Result<.., PlatformError> {
///     let req = extract_json(body)?;
/// }
/// ```
pub fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, PlatformError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| PlatformError::validation(rejection.body_text()))
}
