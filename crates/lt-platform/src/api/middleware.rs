//! API Middleware
//!
//! The authorization gate. Each router declares one [`RoutePolicy`] and
//! installs [`enforce_policy`] as a route layer; handlers then read the
//! resolved caller through the [`Authenticated`] or [`IntegrationCaller`]
//! extractors.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::{AUTHORIZATION, WWW_AUTHENTICATE}, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::PlatformError;
use crate::repository::{ApiKeyStore, ShipmentFeed, UserStore};
use crate::service::{
    checks, extract_bearer_token, AccountService, ApiKeyService, AuthContext, PasswordService,
    RequestMetrics, RoutePolicy, TokenService, API_KEY_HEADER,
};
use super::instrumentation::CallerLabel;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub accounts: Arc<AccountService>,
    pub api_keys: Arc<ApiKeyService>,
    pub metrics: Arc<RequestMetrics>,
    pub shipments: Arc<dyn ShipmentFeed>,
}

impl AppState {
    /// Wire services over the given stores.
    pub fn new(
        tokens: Arc<TokenService>,
        passwords: Arc<PasswordService>,
        users: Arc<dyn UserStore>,
        keys: Arc<dyn ApiKeyStore>,
        shipments: Arc<dyn ShipmentFeed>,
    ) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(users, passwords, tokens.clone())),
            api_keys: Arc::new(ApiKeyService::new(keys)),
            metrics: Arc::new(RequestMetrics::new()),
            tokens,
            shipments,
        }
    }
}

/// State handed to [`enforce_policy`]: shared services plus the route's policy.
#[derive(Clone)]
pub struct GateState {
    app: AppState,
    policy: Arc<RoutePolicy>,
}

impl GateState {
    pub fn new(app: &AppState, policy: RoutePolicy) -> Self {
        Self {
            app: app.clone(),
            policy: Arc::new(policy),
        }
    }
}

/// Integration caller resolved from `X-API-Key`.
#[derive(Debug, Clone)]
pub struct IntegrationKey {
    pub key_id: String,
    pub name: String,
}

pub async fn enforce_policy(
    State(gate): State<GateState>,
    mut request: Request,
    next: Next,
) -> Response {
    let caller = match gate.policy.as_ref() {
        RoutePolicy::Anonymous => None,
        RoutePolicy::ApiKey => {
            let presented = request
                .headers()
                .get(API_KEY_HEADER)
                .and_then(|v| v.to_str().ok());

            match gate.app.api_keys.authenticate(presented).await {
                Ok(record) => {
                    let label = format!("apikey:{}", record.id);
                    request.extensions_mut().insert(IntegrationKey {
                        key_id: record.id,
                        name: record.name,
                    });
                    Some(label)
                }
                Err(e) => return e.into_response(),
            }
        }
        policy => {
            let ctx = match authenticate_session(&gate.app.tokens, request.headers()) {
                Ok(ctx) => ctx,
                Err(e) => return with_bearer_challenge(e.into_response()),
            };

            if let Err(e) = checks::authorize(&ctx, policy) {
                warn!(
                    user_id = %ctx.user_id,
                    roles = ?ctx.roles,
                    path = %request.uri().path(),
                    "Access denied by role policy"
                );
                return with_caller(e.into_response(), Some(format!("user:{}", ctx.user_id)));
            }

            let label = format!("user:{}", ctx.user_id);
            request.extensions_mut().insert(ctx);
            Some(label)
        }
    };

    with_caller(next.run(request).await, caller)
}

/// Validate the bearer credential in `headers`. The precise failure is
/// logged; the caller only ever sees a generic 401.
pub fn authenticate_session(
    tokens: &TokenService,
    headers: &HeaderMap,
) -> Result<AuthContext, PlatformError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            debug!(reason = "missing_header", "Session credential rejected");
            PlatformError::unauthorized("Missing or invalid credentials")
        })?;

    let token = extract_bearer_token(header).ok_or_else(|| {
        debug!(reason = "not_bearer", "Session credential rejected");
        PlatformError::unauthorized("Missing or invalid credentials")
    })?;

    let claims = tokens.validate(token).map_err(|e| {
        warn!(reason = %e, "Session credential rejected");
        PlatformError::unauthorized("Missing or invalid credentials")
    })?;

    Ok(AuthContext::from(claims))
}

fn with_bearer_challenge(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    response
}

fn with_caller(mut response: Response, caller: Option<String>) -> Response {
    if let Some(caller) = caller {
        response.extensions_mut().insert(CallerLabel(caller));
    }
    response
}

/// Extractor for routes behind a session policy
pub struct Authenticated(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(Authenticated)
            .ok_or_else(|| {
                // Route was mounted without a session policy
                PlatformError::unauthorized("Missing or invalid credentials").into_response()
            })
    }
}

/// Extractor for routes behind the API key policy
pub struct IntegrationCaller(pub IntegrationKey);

#[axum::async_trait]
impl<S> FromRequestParts<S> for IntegrationCaller
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IntegrationKey>()
            .cloned()
            .map(IntegrationCaller)
            .ok_or_else(|| {
                PlatformError::unauthorized("Invalid or missing API key").into_response()
            })
    }
}
