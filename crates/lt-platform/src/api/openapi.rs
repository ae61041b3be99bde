//! OpenAPI Documentation
//!
//! Central OpenAPI specification for the platform APIs.

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::service::API_KEY_HEADER;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        components.add_security_scheme(
            "api_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
        );
    }
}

/// Platform API OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "LogiTrack Platform API",
        version = "1.0.0",
        description = "Authentication, integration keys and request metrics"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "auth", description = "Registration, login and session credentials"),
        (name = "admin-api-keys", description = "Integration key administration"),
        (name = "integration", description = "Partner integration feed"),
        (name = "metrics", description = "Request statistics")
    ),
    paths(
        super::auth::register,
        super::auth::login,
        super::auth::me,
        super::api_keys::list_api_keys,
        super::api_keys::create_api_key,
        super::api_keys::deactivate_api_key,
        super::integration::list_integration_shipments,
        super::metrics::get_metrics,
    ),
    components(
        schemas(
            super::auth::RegisterRequest,
            super::auth::LoginRequest,
            super::auth::AuthResponse,
            crate::service::SessionClaims,
            super::api_keys::CreateApiKeyRequest,
            super::api_keys::CreateApiKeyResponse,
            super::api_keys::MessageResponse,
            super::integration::IntegrationShipmentsResponse,
            super::common::ApiError,
            crate::domain::ApiKeyInfo,
            crate::domain::ShipmentSummary,
            crate::service::MetricsSnapshot,
            crate::service::EndpointCount,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct PlatformApiDoc;
