//! Service Layer
//!
//! Business logic for the platform: credential issuance and validation,
//! access policies, accounts and request metrics.

pub mod account;
pub mod api_key;
pub mod authorization;
pub mod metrics;
pub mod password;
pub mod secret;
pub mod token;

pub use account::{AccountService, RegisterCommand, SessionGrant};
pub use api_key::{ApiKeyService, API_KEY_HEADER};
pub use authorization::{checks, AuthContext, RoutePolicy};
pub use metrics::{EndpointCount, MetricsSnapshot, RequestMetrics, UNKNOWN_ENDPOINT};
pub use password::{Argon2Config, PasswordPolicy, PasswordService};
pub use secret::{SecretGenerator, API_KEY_PREFIX};
pub use token::{extract_bearer_token, AuthConfig, SessionClaims, TokenError, TokenService};
