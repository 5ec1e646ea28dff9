//! Remote data gateway trait.

use async_trait::async_trait;

use crate::Result;
use crate::record::Page;
use crate::types::{Cursor, EntityName, RecordId};

/// Request/response access to the backend's entity collections.
///
/// `T` is the record type the caller wants decoded; implementations are
/// usually generic over any deserializable `T`.
#[async_trait]
pub trait Gateway<T>: Send + Sync {
    /// Fetch records `[skip, skip + limit)` and the total count.
    async fn fetch_page(&self, entity: &EntityName, cursor: Cursor) -> Result<Page<T>>;

    /// Run a free-text search. Results are not paginated.
    async fn search(&self, entity: &EntityName, query: &str) -> Result<Vec<T>>;

    /// Fetch a single record by id.
    async fn fetch_one(&self, entity: &EntityName, id: &RecordId) -> Result<T>;

    /// Fetch the whole collection, as used by selector inputs.
    async fn fetch_all(&self, entity: &EntityName) -> Result<Vec<T>>;

    /// Create a record from a JSON body and return it as stored.
    async fn create(&self, entity: &EntityName, body: &serde_json::Value) -> Result<T>;

    /// Apply a partial update and return the record as stored.
    async fn update(
        &self,
        entity: &EntityName,
        id: &RecordId,
        body: &serde_json::Value,
    ) -> Result<T>;
}

#[async_trait]
impl<T, G> Gateway<T> for std::sync::Arc<G>
where
    T: Send + 'static,
    G: Gateway<T> + ?Sized,
{
    async fn fetch_page(&self, entity: &EntityName, cursor: Cursor) -> Result<Page<T>> {
        (**self).fetch_page(entity, cursor).await
    }

    async fn search(&self, entity: &EntityName, query: &str) -> Result<Vec<T>> {
        (**self).search(entity, query).await
    }

    async fn fetch_one(&self, entity: &EntityName, id: &RecordId) -> Result<T> {
        (**self).fetch_one(entity, id).await
    }

    async fn fetch_all(&self, entity: &EntityName) -> Result<Vec<T>> {
        (**self).fetch_all(entity).await
    }

    async fn create(&self, entity: &EntityName, body: &serde_json::Value) -> Result<T> {
        (**self).create(entity, body).await
    }

    async fn update(
        &self,
        entity: &EntityName,
        id: &RecordId,
        body: &serde_json::Value,
    ) -> Result<T> {
        (**self).update(entity, id, body).await
    }
}
