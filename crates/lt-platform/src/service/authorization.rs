//! Authorization
//!
//! Per-route access policies and the caller context they are evaluated
//! against. The gate middleware in `api::middleware` applies these.

use std::collections::BTreeSet;

use crate::domain::role;
use crate::error::{PlatformError, Result};
use super::token::SessionClaims;

/// Authenticated human caller, derived from validated session claims.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub roles: BTreeSet<String>,
    /// The credential as validated
    pub claims: SessionClaims,
}

impl AuthContext {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_any_role<'a, I>(&self, roles: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        roles.into_iter().any(|r| self.roles.contains(r))
    }
}

impl From<SessionClaims> for AuthContext {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            name: claims.unique_name.clone(),
            email: claims.email.clone(),
            roles: claims.role.iter().cloned().collect(),
            claims,
        }
    }
}

/// What a route requires from its caller. A route has exactly one policy,
/// so session and API key credentials never mix on the same route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePolicy {
    Anonymous,
    /// Any valid session credential
    AuthenticatedAny,
    /// Valid session credential holding at least one of these roles
    RequiresRoles(BTreeSet<String>),
    /// Active integration key in `X-API-Key`
    ApiKey,
}

impl RoutePolicy {
    pub fn requires_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::RequiresRoles(roles.into_iter().map(Into::into).collect())
    }

    pub fn admin() -> Self {
        Self::requires_roles([role::ADMIN])
    }
}

/// Authorization checks
pub mod checks {
    use super::*;

    /// Role check for an already authenticated caller.
    pub fn authorize(ctx: &AuthContext, policy: &RoutePolicy) -> Result<()> {
        match policy {
            RoutePolicy::Anonymous | RoutePolicy::AuthenticatedAny => Ok(()),
            RoutePolicy::RequiresRoles(required) if ctx.has_any_role(required) => Ok(()),
            RoutePolicy::RequiresRoles(_) => Err(PlatformError::forbidden(
                "Insufficient role for this resource",
            )),
            RoutePolicy::ApiKey => Err(PlatformError::forbidden(
                "This resource requires an integration key",
            )),
        }
    }
}
