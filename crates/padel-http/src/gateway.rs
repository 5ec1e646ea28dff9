//! REST implementation of the data gateway.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use padel_core::{AccessToken, BackendUrl, Cursor, EntityName, Gateway, Page, RecordId, Result};

use crate::client::RestClient;

/// Path segment of the paging endpoint.
const SKIP: &str = "skip";

/// Path segment of the search endpoint.
const SEARCH: &str = "search";

#[derive(Debug, Serialize)]
struct SkipRequest {
    skip: u64,
    limit: u64,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    input: &'a str,
}

/// A network-backed gateway talking to the backend's REST API.
///
/// | operation    | request                         |
/// |--------------|---------------------------------|
/// | `fetch_page` | `POST /{entity}/skip {skip, limit}` |
/// | `search`     | `POST /{entity}/search {input}` |
/// | `fetch_one`  | `GET /{entity}/{id}`            |
/// | `fetch_all`  | `GET /{entity}`                 |
/// | `create`     | `POST /{entity}`                |
/// | `update`     | `PATCH /{entity}/{id}`          |
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: RestClient,
}

impl HttpGateway {
    /// Create a gateway for the given backend, optionally authenticated.
    pub fn new(backend: BackendUrl, token: Option<&AccessToken>) -> Result<Self> {
        Ok(Self {
            client: RestClient::new(backend, token)?,
        })
    }

    pub fn backend(&self) -> &BackendUrl {
        self.client.backend()
    }
}

#[async_trait]
impl<T> Gateway<T> for HttpGateway
where
    T: DeserializeOwned + Send + 'static,
{
    #[instrument(skip(self), fields(entity = %entity))]
    async fn fetch_page(&self, entity: &EntityName, cursor: Cursor) -> Result<Page<T>> {
        debug!(skip = cursor.skip(), limit = cursor.limit(), "Fetching page");
        let url = self.backend().endpoint(entity, &[SKIP]);
        let request = SkipRequest {
            skip: cursor.skip(),
            limit: cursor.limit(),
        };
        self.client.post(&url, &request).await
    }

    #[instrument(skip(self), fields(entity = %entity))]
    async fn search(&self, entity: &EntityName, query: &str) -> Result<Vec<T>> {
        debug!("Searching");
        let url = self.backend().endpoint(entity, &[SEARCH]);
        self.client.post(&url, &SearchRequest { input: query }).await
    }

    #[instrument(skip(self), fields(entity = %entity))]
    async fn fetch_one(&self, entity: &EntityName, id: &RecordId) -> Result<T> {
        debug!(%id, "Fetching record");
        let url = self.backend().record_endpoint(entity, id);
        self.client.get(&url).await
    }

    #[instrument(skip(self), fields(entity = %entity))]
    async fn fetch_all(&self, entity: &EntityName) -> Result<Vec<T>> {
        debug!("Fetching full collection");
        let url = self.backend().endpoint(entity, &[]);
        self.client.get(&url).await
    }

    #[instrument(skip(self, body), fields(entity = %entity))]
    async fn create(&self, entity: &EntityName, body: &serde_json::Value) -> Result<T> {
        debug!("Creating record");
        let url = self.backend().endpoint(entity, &[]);
        self.client.post(&url, body).await
    }

    #[instrument(skip(self, body), fields(entity = %entity))]
    async fn update(
        &self,
        entity: &EntityName,
        id: &RecordId,
        body: &serde_json::Value,
    ) -> Result<T> {
        debug!(%id, "Updating record");
        let url = self.backend().record_endpoint(entity, id);
        self.client.patch(&url, body).await
    }
}
