//! User Identity Entity
//!
//! Human user as held by the credential store: login names, password hash
//! and role memberships.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// Assigned by the store
    #[serde(rename = "_id")]
    pub id: String,

    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// Argon2id PHC string
    pub password_hash: String,

    /// Role names, unique. Kept sorted so issued claims are deterministic.
    #[serde(default)]
    pub roles: BTreeSet<String>,

    pub created_at: DateTime<Utc>,
}

impl UserIdentity {
    /// Name carried in the session credential: user name, falling back to email.
    pub fn display_name(&self) -> &str {
        self.user_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn role_list(&self) -> Vec<String> {
        self.roles.iter().cloned().collect()
    }
}

impl std::fmt::Debug for UserIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserIdentity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("user_name", &self.user_name)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

/// User to be inserted; the store assigns the id.
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub user_name: Option<String>,
    pub password_hash: String,
    pub roles: BTreeSet<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            user_name: None,
            password_hash: password_hash.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_user_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn into_identity(self, id: impl Into<String>) -> UserIdentity {
        UserIdentity {
            id: id.into(),
            email: self.email,
            user_name: self.user_name,
            password_hash: self.password_hash,
            roles: self.roles,
            created_at: Utc::now(),
        }
    }
}
