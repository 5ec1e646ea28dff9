//! Backend selection by URL scheme.

use std::pin::Pin;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::Stream;

use padel_core::{
    Cursor, DynRecord, EntityName, Gateway, Page, PushChannel, PushEvent, RecordId,
};
use padel_file::FileGateway;
use padel_http::{HttpGateway, SocketIoChannel};

use super::Settings;

pub type CliPushStream =
    Pin<Box<dyn Stream<Item = padel_core::Result<PushEvent<DynRecord>>> + Send>>;

/// Gateway and push channel for whichever backend the URL names.
#[derive(Debug, Clone)]
pub enum CliBackend {
    File(FileGateway),
    Http {
        gateway: HttpGateway,
        push: SocketIoChannel,
    },
}

impl CliBackend {
    pub fn connect(settings: &Settings) -> Result<Self> {
        if settings.backend.is_local() {
            let gateway =
                FileGateway::from_url(&settings.backend).context("Invalid file:// backend")?;
            Ok(CliBackend::File(gateway))
        } else {
            let gateway = HttpGateway::new(settings.backend.clone(), settings.token.as_ref())
                .context("Failed to create HTTP client")?;
            let push = SocketIoChannel::new(settings.backend.clone());
            Ok(CliBackend::Http { gateway, push })
        }
    }
}

#[async_trait]
impl Gateway<DynRecord> for CliBackend {
    async fn fetch_page(
        &self,
        entity: &EntityName,
        cursor: Cursor,
    ) -> padel_core::Result<Page<DynRecord>> {
        match self {
            CliBackend::File(gateway) => gateway.fetch_page(entity, cursor).await,
            CliBackend::Http { gateway, .. } => gateway.fetch_page(entity, cursor).await,
        }
    }

    async fn search(&self, entity: &EntityName, query: &str) -> padel_core::Result<Vec<DynRecord>> {
        match self {
            CliBackend::File(gateway) => gateway.search(entity, query).await,
            CliBackend::Http { gateway, .. } => gateway.search(entity, query).await,
        }
    }

    async fn fetch_one(&self, entity: &EntityName, id: &RecordId) -> padel_core::Result<DynRecord> {
        match self {
            CliBackend::File(gateway) => gateway.fetch_one(entity, id).await,
            CliBackend::Http { gateway, .. } => gateway.fetch_one(entity, id).await,
        }
    }

    async fn fetch_all(&self, entity: &EntityName) -> padel_core::Result<Vec<DynRecord>> {
        match self {
            CliBackend::File(gateway) => gateway.fetch_all(entity).await,
            CliBackend::Http { gateway, .. } => gateway.fetch_all(entity).await,
        }
    }

    async fn create(
        &self,
        entity: &EntityName,
        body: &serde_json::Value,
    ) -> padel_core::Result<DynRecord> {
        match self {
            CliBackend::File(gateway) => gateway.create(entity, body).await,
            CliBackend::Http { gateway, .. } => gateway.create(entity, body).await,
        }
    }

    async fn update(
        &self,
        entity: &EntityName,
        id: &RecordId,
        body: &serde_json::Value,
    ) -> padel_core::Result<DynRecord> {
        match self {
            CliBackend::File(gateway) => gateway.update(entity, id, body).await,
            CliBackend::Http { gateway, .. } => gateway.update(entity, id, body).await,
        }
    }
}

impl PushChannel<DynRecord> for CliBackend {
    type Stream = CliPushStream;

    fn subscribe(&self, entity: &EntityName) -> padel_core::Result<Self::Stream> {
        match self {
            CliBackend::File(gateway) => {
                let stream = PushChannel::<DynRecord>::subscribe(&gateway.push_channel(), entity)?;
                Ok(Box::pin(stream))
            }
            CliBackend::Http { push, .. } => {
                let stream = PushChannel::<DynRecord>::subscribe(push, entity)?;
                Ok(Box::pin(stream))
            }
        }
    }
}
