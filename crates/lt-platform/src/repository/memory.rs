//! In-memory credential store
//!
//! Backs tests and `LT_STORE=memory`. Ids are assigned sequentially.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use subtle::ConstantTimeEq;

use crate::domain::{ApiKeyRecord, NewApiKey, NewUser, ShipmentSummary, UserIdentity};
use crate::error::{PlatformError, Result};
use super::{duplicate_user_error, ApiKeyStore, ShipmentFeed, UserStore};

#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<Vec<UserIdentity>>,
    api_keys: RwLock<Vec<ApiKeyRecord>>,
    next_user_id: AtomicU64,
    next_key_id: AtomicU64,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    pub fn key_count(&self) -> usize {
        self.api_keys.read().len()
    }
}

#[async_trait]
impl UserStore for InMemoryCredentialStore {
    async fn find_user(&self, id: &str) -> Result<Option<UserIdentity>> {
        Ok(self.users.read().iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserIdentity>> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<UserIdentity>> {
        Ok(self
            .users
            .read()
            .iter()
            .find(|u| u.user_name.as_deref() == Some(user_name))
            .cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserIdentity> {
        let mut users = self.users.write();

        if users.iter().any(|u| u.email == user.email) {
            return Err(duplicate_user_error("Email", &user.email));
        }
        if let Some(ref name) = user.user_name {
            if users.iter().any(|u| u.user_name.as_deref() == Some(name.as_str())) {
                return Err(duplicate_user_error("Username", name));
            }
        }

        let id = self.next_user_id.fetch_add(1, Ordering::Relaxed) + 1;
        let identity = user.into_identity(id.to_string());
        users.push(identity.clone());
        Ok(identity)
    }

    async fn add_role(&self, user_id: &str, role: &str) -> Result<()> {
        let mut users = self.users.write();
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| PlatformError::not_found("User", user_id))?;
        user.roles.insert(role.to_string());
        Ok(())
    }
}

#[async_trait]
impl ApiKeyStore for InMemoryCredentialStore {
    async fn insert_key(&self, key: NewApiKey) -> Result<ApiKeyRecord> {
        let mut keys = self.api_keys.write();
        if keys.iter().any(|k| k.key == key.key) {
            return Err(PlatformError::internal("API key secret collision"));
        }
        let id = self.next_key_id.fetch_add(1, Ordering::Relaxed) + 1;
        let record = key.into_record(id.to_string());
        keys.push(record.clone());
        Ok(record)
    }

    async fn list_keys(&self) -> Result<Vec<ApiKeyRecord>> {
        Ok(self.api_keys.read().clone())
    }

    async fn find_key(&self, id: &str) -> Result<Option<ApiKeyRecord>> {
        Ok(self.api_keys.read().iter().find(|k| k.id == id).cloned())
    }

    async fn find_active_key(&self, secret: &str) -> Result<Option<ApiKeyRecord>> {
        Ok(self
            .api_keys
            .read()
            .iter()
            .find(|k| k.active && bool::from(k.key.as_bytes().ct_eq(secret.as_bytes())))
            .cloned())
    }

    async fn deactivate_key(&self, id: &str) -> Result<bool> {
        let mut keys = self.api_keys.write();
        match keys.iter_mut().find(|k| k.id == id) {
            Some(record) => {
                record.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryShipmentFeed {
    shipments: RwLock<Vec<ShipmentSummary>>,
}

impl InMemoryShipmentFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shipments(shipments: Vec<ShipmentSummary>) -> Self {
        Self {
            shipments: RwLock::new(shipments),
        }
    }
}

#[async_trait]
impl ShipmentFeed for InMemoryShipmentFeed {
    async fn list_shipments(&self) -> Result<Vec<ShipmentSummary>> {
        Ok(self.shipments.read().clone())
    }
}
