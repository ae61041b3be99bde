//! API Key Repository

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::{doc, oid::ObjectId}, options::FindOptions};
use tracing::error;

use crate::domain::{ApiKeyRecord, NewApiKey};
use crate::error::{PlatformError, Result};
use super::ApiKeyStore;

pub struct ApiKeyRepository {
    collection: Collection<ApiKeyRecord>,
}

impl ApiKeyRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("api_keys"),
        }
    }
}

#[async_trait]
impl ApiKeyStore for ApiKeyRepository {
    async fn insert_key(&self, key: NewApiKey) -> Result<ApiKeyRecord> {
        let record = key.into_record(ObjectId::new().to_hex());
        self.collection.insert_one(&record, None).await.map_err(|e| {
            error!(operation = "insert_key", api_key_id = %record.id, api_key_name = %record.name, error = %e, "API key insert failed");
            PlatformError::Database(e)
        })?;
        Ok(record)
    }

    async fn list_keys(&self) -> Result<Vec<ApiKeyRecord>> {
        // ObjectId hex sorts by creation time
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let cursor = self.collection.find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_key(&self, id: &str) -> Result<Option<ApiKeyRecord>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_active_key(&self, secret: &str) -> Result<Option<ApiKeyRecord>> {
        Ok(self.collection
            .find_one(doc! { "key": secret, "active": true }, None)
            .await?)
    }

    async fn deactivate_key(&self, id: &str) -> Result<bool> {
        let result = self.collection
            .update_one(doc! { "_id": id }, doc! { "$set": { "active": false } }, None)
            .await
            .map_err(|e| {
                error!(operation = "deactivate_key", api_key_id = %id, error = %e, "API key deactivation failed");
                PlatformError::Database(e)
            })?;
        Ok(result.matched_count > 0)
    }
}
