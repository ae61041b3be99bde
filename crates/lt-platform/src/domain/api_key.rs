//! API Key Entity
//!
//! Long-lived integration secrets. A key is created once and afterwards can
//! only be deactivated; the secret is never rotated or recomputed.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use utoipa::ToSchema;

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRecord {
    /// Assigned by the store
    #[serde(rename = "_id")]
    pub id: String,

    /// Trimmed, non-blank display name
    pub name: String,

    /// Opaque secret presented in the `X-API-Key` header
    pub key: String,

    pub active: bool,

    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for ApiKeyRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("active", &self.active)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Key to be inserted; the store assigns the id.
#[derive(Clone)]
pub struct NewApiKey {
    pub name: String,
    pub key: String,
    pub created_at: DateTime<Utc>,
}

impl NewApiKey {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            created_at: Utc::now(),
        }
    }

    /// New keys are always active.
    pub fn into_record(self, id: impl Into<String>) -> ApiKeyRecord {
        ApiKeyRecord {
            id: id.into(),
            name: self.name,
            key: self.key,
            active: true,
            created_at: self.created_at,
        }
    }
}

/// Key metadata without the secret, as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyInfo {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ApiKeyRecord> for ApiKeyInfo {
    fn from(record: ApiKeyRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            active: record.active,
            created_at: record.created_at,
        }
    }
}
