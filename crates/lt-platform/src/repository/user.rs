//! User Repository

use async_trait::async_trait;
use mongodb::{Collection, Database, bson::{doc, oid::ObjectId}};
use tracing::error;

use crate::domain::{NewUser, UserIdentity};
use crate::error::{PlatformError, Result};
use super::{duplicate_user_error, UserStore};

pub struct UserRepository {
    collection: Collection<UserIdentity>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("users"),
        }
    }
}

/// Unique index violation (E11000).
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == 11000
    )
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_user(&self, id: &str) -> Result<Option<UserIdentity>> {
        Ok(self.collection.find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserIdentity>> {
        Ok(self.collection.find_one(doc! { "email": email }, None).await?)
    }

    async fn find_user_by_name(&self, user_name: &str) -> Result<Option<UserIdentity>> {
        Ok(self.collection.find_one(doc! { "userName": user_name }, None).await?)
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserIdentity> {
        let identity = user.into_identity(ObjectId::new().to_hex());

        match self.collection.insert_one(&identity, None).await {
            Ok(_) => Ok(identity),
            Err(e) if is_duplicate_key(&e) => {
                Err(duplicate_user_error("Email or username", identity.display_name()))
            }
            Err(e) => {
                error!(operation = "insert_user", user_id = %identity.id, error = %e, "User insert failed");
                Err(PlatformError::Database(e))
            }
        }
    }

    async fn add_role(&self, user_id: &str, role: &str) -> Result<()> {
        let result = self.collection
            .update_one(
                doc! { "_id": user_id },
                doc! { "$addToSet": { "roles": role } },
                None,
            )
            .await
            .map_err(|e| {
                error!(operation = "add_role", user_id = %user_id, role = %role, error = %e, "Role assignment failed");
                PlatformError::Database(e)
            })?;

        if result.matched_count == 0 {
            return Err(PlatformError::not_found("User", user_id));
        }
        Ok(())
    }
}
