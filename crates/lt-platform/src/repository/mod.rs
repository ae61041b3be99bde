//! Repository Layer
//!
//! The credential store as seen by the platform: async traits for users,
//! API keys and the shipment feed, with MongoDB and in-memory implementations.

use async_trait::async_trait;

use crate::domain::{ApiKeyRecord, NewApiKey, NewUser, ShipmentSummary, UserIdentity};
use crate::error::Result;

pub mod api_key;
pub mod indexes;
pub mod memory;
pub mod shipment;
pub mod user;

pub use api_key::ApiKeyRepository;
pub use indexes::ensure_indexes;
pub use memory::{InMemoryCredentialStore, InMemoryShipmentFeed};
pub use shipment::ShipmentRepository;
pub use user::UserRepository;

/// User records, password hashes and role memberships.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<UserIdentity>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserIdentity>>;

    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<UserIdentity>>;

    /// Fails with `ValidationErrors` on a duplicate email or user name.
    async fn insert_user(&self, user: NewUser) -> Result<UserIdentity>;

    /// Idempotent; adding a role the user already holds is a no-op.
    async fn add_role(&self, user_id: &str, role: &str) -> Result<()>;
}

/// API key records.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    async fn insert_key(&self, key: NewApiKey) -> Result<ApiKeyRecord>;

    /// All keys in creation order.
    async fn list_keys(&self) -> Result<Vec<ApiKeyRecord>>;

    async fn find_key(&self, id: &str) -> Result<Option<ApiKeyRecord>>;

    /// Exact secret match among active keys only.
    async fn find_active_key(&self, secret: &str) -> Result<Option<ApiKeyRecord>>;

    /// Sets `active = false`. Returns `false` when no key has this id.
    async fn deactivate_key(&self, id: &str) -> Result<bool>;
}

/// Shipments visible to integration callers.
#[async_trait]
pub trait ShipmentFeed: Send + Sync {
    async fn list_shipments(&self) -> Result<Vec<ShipmentSummary>>;
}

pub(crate) fn duplicate_user_error(field: &str, value: &str) -> crate::error::PlatformError {
    crate::error::PlatformError::ValidationErrors {
        errors: vec![format!("{} '{}' is already taken.", field, value)],
    }
}
