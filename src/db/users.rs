//! User persistence

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson};
use mongodb::Collection;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Database;
use crate::models::{NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("MongoDB did not respond within {0:?}")]
    Timeout(Duration),
}

/// Document shape in the users collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Bson>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
}

impl From<NewUser> for UserDocument {
    fn from(user: NewUser) -> Self {
        Self {
            id: None,
            name: user.name,
            email: user.email,
            username: user.username,
        }
    }
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.id.as_ref().map(stringify_id).unwrap_or_default(),
            name: doc.name,
            email: doc.email,
            username: doc.username,
        }
    }
}

/// Render a store-assigned id as a string. ObjectIds become their 24-char
/// hex form, strings pass through, anything else uses its display form.
pub fn stringify_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Operations the HTTP handlers run against the user collection
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Every stored user
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Insert all users, returning their ids in insertion order
    async fn insert_many(&self, users: Vec<NewUser>) -> Result<Vec<String>, StoreError>;

    /// Remove every user, returning how many were deleted
    async fn delete_all(&self) -> Result<u64, StoreError>;
}

pub struct MongoUserStore {
    collection: Collection<UserDocument>,
}

impl MongoUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.users(),
        }
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let cursor = self.collection.find(doc! {}, None).await?;
        let docs: Vec<UserDocument> = cursor.try_collect().await?;

        Ok(docs.into_iter().map(User::from).collect())
    }

    async fn insert_many(&self, users: Vec<NewUser>) -> Result<Vec<String>, StoreError> {
        let docs: Vec<UserDocument> = users.into_iter().map(UserDocument::from).collect();
        let result = self.collection.insert_many(docs, None).await?;

        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);

        Ok(ids.iter().map(|(_, id)| stringify_id(id)).collect())
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let result = self.collection.delete_many(doc! {}, None).await?;
        Ok(result.deleted_count)
    }
}
