//! Development Data Seeder
//!
//! Creates the `admin` and `user1` accounts on an empty store so a local
//! server is usable straight away. Existing accounts are left untouched.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{role, NewUser};
use crate::error::Result;
use crate::repository::UserStore;
use crate::service::PasswordService;

/// One account the seeder ensures
#[derive(Debug, Clone)]
pub struct SeedAccount {
    pub user_name: &'static str,
    pub email: &'static str,
    pub role: &'static str,
    pub password: String,
}

pub struct DevDataSeeder {
    users: Arc<dyn UserStore>,
    passwords: Arc<PasswordService>,
    accounts: Vec<SeedAccount>,
}

impl DevDataSeeder {
    pub fn new(
        users: Arc<dyn UserStore>,
        passwords: Arc<PasswordService>,
        seed: &lt_config::SeedConfig,
    ) -> Self {
        let accounts = vec![
            SeedAccount {
                user_name: "admin",
                email: "admin@example.com",
                role: role::ADMIN,
                password: seed.admin_password.clone(),
            },
            SeedAccount {
                user_name: "user1",
                email: "user@example.com",
                role: role::USER,
                password: seed.user_password.clone(),
            },
        ];

        Self { users, passwords, accounts }
    }

    /// Returns the number of accounts created.
    pub async fn run(&self) -> Result<usize> {
        let mut created = 0;

        for account in &self.accounts {
            if self.users.find_user_by_email(account.email).await?.is_some()
                || self.users.find_user_by_name(account.user_name).await?.is_some()
            {
                info!(user_name = account.user_name, "Seed account already present");
                continue;
            }

            if let Err(errors) = self.passwords.validate_policy(&account.password) {
                warn!(
                    user_name = account.user_name,
                    errors = ?errors,
                    "Seed password does not satisfy the password policy"
                );
            }

            let hash = self.passwords.hash_password(&account.password)?;
            let user = self
                .users
                .insert_user(NewUser::new(account.email, hash).with_user_name(account.user_name))
                .await?;
            self.users.add_role(&user.id, account.role).await?;

            info!(user_id = %user.id, user_name = account.user_name, role = account.role, "Seed account created");
            created += 1;
        }

        Ok(created)
    }
}
