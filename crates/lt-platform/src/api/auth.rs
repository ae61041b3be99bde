//! Auth API
//!
//! Registration, login and the caller's own claim set.

use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::UserIdentity;
use crate::error::PlatformError;
use crate::service::{RegisterCommand, RoutePolicy, SessionClaims, SessionGrant};
use super::common::{endpoints, extract_json};
use super::instrumentation::tag_endpoint;
use super::middleware::{enforce_policy, AppState, Authenticated, GateState};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub user_name: Option<String>,
    /// Defaults to `User`
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Email address or user name
    #[serde(alias = "email", alias = "userName")]
    pub email_or_user_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: String,
    pub email: String,
    pub user_name: Option<String>,
    pub token: String,
    pub roles: Vec<String>,
}

impl From<SessionGrant> for AuthResponse {
    fn from(grant: SessionGrant) -> Self {
        let SessionGrant { user, token } = grant;
        let roles = user.role_list();
        let UserIdentity { id, email, user_name, .. } = user;
        Self {
            user_id: id,
            email,
            user_name,
            token,
            roles,
        }
    }
}

/// Register a new user
///
/// Creates the account, assigns its role and returns a session token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = AuthResponse),
        (status = 400, description = "Validation errors", body = super::common::ApiError)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, PlatformError> {
    let req = extract_json(body)?;
    let grant = state
        .accounts
        .register(RegisterCommand {
            email: req.email,
            password: req.password,
            user_name: req.user_name,
            role: req.role,
        })
        .await?;

    Ok(Json(grant.into()))
}

/// Login with email or user name
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Malformed body", body = super::common::ApiError),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, PlatformError> {
    let req = extract_json(body)?;
    let grant = state
        .accounts
        .login(&req.email_or_user_name, &req.password)
        .await?;

    Ok(Json(grant.into()))
}

/// Current caller
///
/// Returns the full claim set of the presented credential.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Caller claims", body = SessionClaims),
        (status = 401, description = "Missing or invalid credentials")
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(Authenticated(ctx): Authenticated) -> Json<SessionClaims> {
    Json(ctx.claims)
}

pub fn auth_router(state: AppState) -> Router {
    let session = Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            GateState::new(&state, RoutePolicy::AuthenticatedAny),
            enforce_policy,
        ));

    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            GateState::new(&state, RoutePolicy::Anonymous),
            enforce_policy,
        ));

    Router::new()
        .merge(public)
        .merge(session)
        .route_layer(middleware::from_fn_with_state(endpoints::AUTH, tag_endpoint))
        .with_state(state)
}
