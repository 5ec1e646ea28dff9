//! File-backed implementation of the data gateway.

use std::path::Path;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use padel_core::error::{InvalidInputError, MalformedResponse};
use padel_core::{BackendUrl, Cursor, DynRecord, EntityName, Gateway, Page, RecordId, Result};

use crate::push::FilePushChannel;
use crate::store::FileStore;

/// A gateway over a local directory, for offline work and tests.
#[derive(Debug, Clone)]
pub struct FileGateway {
    store: FileStore,
}

impl FileGateway {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            store: FileStore::new(root),
        }
    }

    /// Open the directory a `file://` backend URL points at.
    pub fn from_url(backend: &BackendUrl) -> Result<Self> {
        let root = backend
            .to_file_path()
            .ok_or_else(|| InvalidInputError::BackendUrl {
                value: backend.to_string(),
                reason: "not a file:// URL".to_string(),
            })?;
        Ok(Self::new(root))
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    /// A push channel tailing this gateway's push log.
    pub fn push_channel(&self) -> FilePushChannel {
        FilePushChannel::new(self.store.clone())
    }
}

fn decode<T: DeserializeOwned>(record: DynRecord) -> Result<T> {
    let context = format!("record {}", record.id);
    let value = serde_json::Value::Object({
        let mut map = record.fields;
        map.insert("_id".to_string(), record.id.as_str().into());
        map
    });
    serde_json::from_value(value).map_err(|e| MalformedResponse::new(context, e).into())
}

fn decode_all<T: DeserializeOwned>(records: Vec<DynRecord>) -> Result<Vec<T>> {
    records.into_iter().map(decode).collect()
}

#[async_trait]
impl<T> Gateway<T> for FileGateway
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(&self, entity: &EntityName, cursor: Cursor) -> Result<Page<T>> {
        let (items, total) = self.store.page(entity, cursor)?;
        Ok(Page::new(decode_all(items)?, total))
    }

    async fn search(&self, entity: &EntityName, query: &str) -> Result<Vec<T>> {
        decode_all(self.store.search(entity, query)?)
    }

    async fn fetch_one(&self, entity: &EntityName, id: &RecordId) -> Result<T> {
        decode(self.store.get(entity, id)?)
    }

    async fn fetch_all(&self, entity: &EntityName) -> Result<Vec<T>> {
        decode_all(self.store.list(entity)?)
    }

    async fn create(&self, entity: &EntityName, body: &serde_json::Value) -> Result<T> {
        decode(self.store.create(entity, body)?)
    }

    async fn update(
        &self,
        entity: &EntityName,
        id: &RecordId,
        body: &serde_json::Value,
    ) -> Result<T> {
        decode(self.store.update(entity, id, body)?)
    }
}
