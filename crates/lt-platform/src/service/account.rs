//! Account Service
//!
//! Registration and login for human users. Both paths end in a freshly
//! issued session credential.

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::{role, NewUser, UserIdentity};
use crate::error::{PlatformError, Result};
use crate::repository::UserStore;
use super::password::PasswordService;
use super::token::TokenService;

#[derive(Debug, Clone, Default)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
    pub user_name: Option<String>,
    /// Defaults to `User` when absent or blank
    pub role: Option<String>,
}

/// Outcome of a successful register or login.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub user: UserIdentity,
    pub token: String,
}

pub struct AccountService {
    users: Arc<dyn UserStore>,
    passwords: Arc<PasswordService>,
    tokens: Arc<TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        passwords: Arc<PasswordService>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self { users, passwords, tokens }
    }

    pub async fn register(&self, command: RegisterCommand) -> Result<SessionGrant> {
        let email = normalize_email(&command.email);
        let mut errors = Vec::new();

        if !looks_like_email(&email) {
            errors.push(format!("Email '{}' is invalid.", command.email.trim()));
        }
        if let Err(policy_errors) = self.passwords.validate_policy(&command.password) {
            errors.extend(policy_errors);
        }
        if !errors.is_empty() {
            return Err(PlatformError::ValidationErrors { errors });
        }

        let user_name = command
            .user_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&email)
            .to_string();
        let role = command
            .role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(role::USER)
            .to_string();

        let password_hash = self.passwords.hash_password(&command.password)?;
        let mut user = self
            .users
            .insert_user(NewUser::new(email, password_hash).with_user_name(user_name))
            .await?;

        // Membership is its own write; the insert carries no roles
        self.users.add_role(&user.id, &role).await?;
        user.roles.insert(role);

        let token = self.tokens.issue(&user)?;
        info!(user_id = %user.id, roles = ?user.roles, "User registered");
        Ok(SessionGrant { user, token })
    }

    /// `login` is matched against email first, then user name.
    pub async fn login(&self, login: &str, password: &str) -> Result<SessionGrant> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(PlatformError::InvalidCredentials);
        }

        let user = match self.users.find_user_by_email(&normalize_email(login)).await? {
            Some(user) => Some(user),
            None => self.users.find_user_by_name(login).await?,
        };

        let Some(user) = user else {
            debug!(reason = "unknown_login", "Login rejected");
            return Err(PlatformError::InvalidCredentials);
        };

        if !self.passwords.verify_password(password, &user.password_hash)? {
            debug!(user_id = %user.id, reason = "wrong_password", "Login rejected");
            return Err(PlatformError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user)?;
        info!(user_id = %user.id, "User logged in");
        Ok(SessionGrant { user, token })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
