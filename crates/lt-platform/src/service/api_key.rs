//! API Key Service
//!
//! Issues, lists, deactivates and authenticates long-lived integration keys.
//! Keys are never deleted; deactivation is the only revocation.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{ApiKeyInfo, ApiKeyRecord, NewApiKey};
use crate::error::{PlatformError, Result};
use crate::repository::ApiKeyStore;
use super::secret::SecretGenerator;

/// Header carrying the integration key
pub const API_KEY_HEADER: &str = "X-API-Key";

pub struct ApiKeyService {
    store: Arc<dyn ApiKeyStore>,
    generator: SecretGenerator,
}

impl ApiKeyService {
    pub fn new(store: Arc<dyn ApiKeyStore>) -> Self {
        Self {
            store,
            generator: SecretGenerator::default(),
        }
    }

    /// The only call that returns the secret. Names need not be unique.
    pub async fn create(&self, name: &str) -> Result<ApiKeyRecord> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlatformError::validation("Name is required"));
        }

        let record = self
            .store
            .insert_key(NewApiKey::new(name, self.generator.generate()))
            .await?;

        info!(key_id = %record.id, name = %record.name, "API key created");
        Ok(record)
    }

    /// All keys in creation order, secrets omitted.
    pub async fn list(&self) -> Result<Vec<ApiKeyInfo>> {
        let keys = self.store.list_keys().await?;
        Ok(keys.into_iter().map(ApiKeyInfo::from).collect())
    }

    /// Idempotent on keys that exist; `NotFound` otherwise.
    pub async fn deactivate(&self, id: &str) -> Result<()> {
        let existing = self
            .store
            .find_key(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("ApiKey", id))?;

        if !existing.active {
            info!(key_id = %id, "API key already inactive");
            return Ok(());
        }

        if !self.store.deactivate_key(id).await? {
            return Err(PlatformError::not_found("ApiKey", id));
        }

        info!(key_id = %id, name = %existing.name, "API key deactivated");
        Ok(())
    }

    /// Resolve a presented secret to an active key. Every rejection looks the
    /// same to the caller; the reason is only logged.
    pub async fn authenticate(&self, presented: Option<&str>) -> Result<ApiKeyRecord> {
        let secret = match presented.filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                warn!(reason = "missing", "API key rejected");
                return Err(invalid_api_key());
            }
        };

        if !self.generator.is_well_formed(secret) {
            warn!(reason = "malformed", "API key rejected");
            return Err(invalid_api_key());
        }

        match self.store.find_active_key(secret).await? {
            Some(record) => Ok(record),
            None => {
                warn!(reason = "unknown_or_inactive", "API key rejected");
                Err(invalid_api_key())
            }
        }
    }
}

fn invalid_api_key() -> PlatformError {
    PlatformError::unauthorized("Invalid or missing API key")
}
