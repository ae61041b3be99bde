//! Shipment Repository (read-only integration feed)

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{Collection, Database, bson::doc};

use crate::domain::ShipmentSummary;
use crate::error::Result;
use super::ShipmentFeed;

pub struct ShipmentRepository {
    collection: Collection<ShipmentSummary>,
}

impl ShipmentRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("shipments"),
        }
    }
}

#[async_trait]
impl ShipmentFeed for ShipmentRepository {
    async fn list_shipments(&self) -> Result<Vec<ShipmentSummary>> {
        let cursor = self.collection.find(doc! {}, None).await?;
        Ok(cursor.try_collect().await?)
    }
}
