//! Index setup for the credential store collections

use mongodb::{
    Database, IndexModel,
    bson::{doc, Document},
    options::IndexOptions,
};
use tracing::info;

use crate::error::Result;

/// Create the unique indexes the stores rely on. Safe to run on every start.
pub async fn ensure_indexes(db: &Database) -> Result<()> {
    let users = db.collection::<Document>("users");
    users
        .create_index(unique_index(doc! { "email": 1 }, false), None)
        .await?;
    // userName is optional, so the index skips documents without it
    users
        .create_index(unique_index(doc! { "userName": 1 }, true), None)
        .await?;

    let api_keys = db.collection::<Document>("api_keys");
    api_keys
        .create_index(unique_index(doc! { "key": 1 }, false), None)
        .await?;

    info!("Credential store indexes ensured");
    Ok(())
}

fn unique_index(keys: Document, sparse: bool) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).sparse(sparse).build())
        .build()
}
