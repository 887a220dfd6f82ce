//! In-process stores backing `AppState::fake()` in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, PublicUser, User},
    },
    error::StoreError,
    resources::{
        collection::Collection,
        repo::DocumentStore,
        repo_types::{Body, Document},
    },
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new: NewUser<'_>) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Conflict);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name.to_string(),
            email: new.email.to_string(),
            password_hash: new.password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn list_public(&self) -> Result<Vec<PublicUser>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().cloned().map(PublicUser::from).collect())
    }
}

pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
    enforce_unique: bool,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self {
            collections: RwLock::default(),
            enforce_unique: true,
        }
    }
}

impl MemoryDocumentStore {
    /// A store without unique indexes, like a database whose migrations never ran.
    pub fn without_constraints() -> Self {
        Self {
            enforce_unique: false,
            ..Self::default()
        }
    }
}

/// Mirrors `body->>'field'`: nulls never collide.
fn unique_key(body: &Body, field: &str) -> Option<String> {
    match body.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn violates_unique(docs: &[Document], collection: Collection, body: &Body, skip: Option<Uuid>) -> bool {
    let Some(field) = collection.unique_field() else {
        return false;
    };
    let Some(key) = unique_key(body, field) else {
        return false;
    };
    docs.iter()
        .filter(|d| Some(d.id) != skip)
        .any(|d| unique_key(&d.body, field).as_deref() == Some(key.as_str()))
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: Collection, body: Body) -> Result<Document, StoreError> {
        let mut all = self.collections.write().await;
        let docs = all.entry(collection).or_default();
        if self.enforce_unique && violates_unique(docs, collection, &body, None) {
            return Err(StoreError::Conflict);
        }
        let doc = Document {
            id: Uuid::new_v4(),
            body,
            created_at: OffsetDateTime::now_utc(),
        };
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let all = self.collections.read().await;
        Ok(all.get(&collection).cloned().unwrap_or_default())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let all = self.collections.read().await;
        Ok(all
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, StoreError> {
        let all = self.collections.read().await;
        Ok(all
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.str_field(field) == Some(value)))
            .cloned())
    }

    async fn merge(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Body,
    ) -> Result<Option<Document>, StoreError> {
        let mut all = self.collections.write().await;
        let docs = all.entry(collection).or_default();
        let Some(pos) = docs.iter().position(|d| d.id == id) else {
            return Ok(None);
        };

        let mut merged = docs[pos].body.clone();
        merged.extend(patch);
        if merged == docs[pos].body {
            return Ok(None);
        }
        if self.enforce_unique && violates_unique(docs, collection, &merged, Some(id)) {
            return Err(StoreError::Conflict);
        }
        docs[pos].body = merged;
        Ok(Some(docs[pos].clone()))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let mut all = self.collections.write().await;
        let Some(docs) = all.get_mut(&collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() != before)
    }
}
