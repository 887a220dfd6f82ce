use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::collection::Collection;
use super::repo_types::{Body, Document, DocumentRow};
use crate::error::StoreError;

/// Uniform CRUD over the document collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document; `StoreError::Conflict` if it repeats the collection's unique field.
    async fn insert(&self, collection: Collection, body: Body) -> Result<Document, StoreError>;

    /// All documents in insertion order.
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// First document whose top-level `field` is the string `value`.
    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Merge `patch` into the top level of the stored body.
    /// `None` when no document matched or the merge changed nothing.
    async fn merge(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Body,
    ) -> Result<Option<Document>, StoreError>;

    /// `true` if a document was removed.
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: Collection, body: Body) -> Result<Document, StoreError> {
        let sql = format!(
            "INSERT INTO {} (body) VALUES ($1) RETURNING id, body, created_at",
            collection.table()
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(Json(&body))
            .fetch_one(&self.db)
            .await?;
        Ok(row.into())
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let sql = format!(
            "SELECT id, body, created_at FROM {} ORDER BY created_at ASC, id ASC",
            collection.table()
        );
        let rows = sqlx::query_as::<_, DocumentRow>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn get(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "SELECT id, body, created_at FROM {} WHERE id = $1",
            collection.table()
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            "SELECT id, body, created_at FROM {} WHERE body->>$1 = $2 ORDER BY created_at ASC LIMIT 1",
            collection.table()
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(field)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn merge(
        &self,
        collection: Collection,
        id: Uuid,
        patch: Body,
    ) -> Result<Option<Document>, StoreError> {
        let sql = format!(
            r#"
            UPDATE {}
               SET body = body || $2
             WHERE id = $1
               AND body || $2 IS DISTINCT FROM body
            RETURNING id, body, created_at
            "#,
            collection.table()
        );
        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(id)
            .bind(Json(&patch))
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", collection.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.db).await?;
        Ok(result.rows_affected() > 0)
    }
}
