//! socket.io push channel.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, trace, warn};

use padel_core::error::{Error, TransportError};
use padel_core::{BackendUrl, EntityName, PushChannel, PushEvent, Result};

use crate::socketio::{self, Frame, PONG, ROOT_NAMESPACE};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Push channel over the backend's socket.io endpoint.
///
/// Each subscription opens its own websocket and yields the events named
/// after the subscribed entity. The socket is closed when the stream is
/// dropped. Unless disabled, lost connections are re-established with
/// exponential backoff.
#[derive(Debug, Clone)]
pub struct SocketIoChannel {
    backend: BackendUrl,
    namespace: String,
    reconnect: bool,
}

impl SocketIoChannel {
    pub fn new(backend: BackendUrl) -> Self {
        Self {
            backend,
            namespace: ROOT_NAMESPACE.to_string(),
            reconnect: true,
        }
    }

    /// Join a namespace other than `/`.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// End the stream on the first disconnect instead of reconnecting.
    pub fn without_reconnect(mut self) -> Self {
        self.reconnect = false;
        self
    }

    pub fn backend(&self) -> &BackendUrl {
        &self.backend
    }
}

impl<T> PushChannel<T> for SocketIoChannel
where
    T: DeserializeOwned + Send + 'static,
{
    type Stream = SocketIoStream<T>;

    fn subscribe(&self, entity: &EntityName) -> Result<Self::Stream> {
        let url = self.backend.socket_url();
        let namespace = self.namespace.clone();
        let entity = entity.clone();
        let reconnect = self.reconnect;

        let stream = async_stream::stream! {
            let mut backoff = INITIAL_BACKOFF;

            loop {
                info!(%url, %entity, "Connecting to push channel");
                match connect_async(&url).await {
                    Ok((ws, _)) => {
                        debug!("WebSocket connected");
                        let mut session = Box::pin(session::<T, _>(ws, namespace.clone(), entity.clone()));
                        while let Some(item) = session.next().await {
                            if item.is_ok() {
                                backoff = INITIAL_BACKOFF;
                            }
                            yield item;
                        }
                    }
                    Err(e) => {
                        yield Err(Error::Transport(TransportError::Connection {
                            message: e.to_string(),
                        }));
                    }
                }

                if !reconnect {
                    break;
                }
                debug!(delay_ms = backoff.as_millis() as u64, "Reconnecting push channel");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        };

        Ok(SocketIoStream::new(stream))
    }
}

/// Stream of push events from one socket.io subscription.
pub struct SocketIoStream<T> {
    inner: Pin<Box<dyn Stream<Item = Result<PushEvent<T>>> + Send>>,
}

impl<T> SocketIoStream<T> {
    fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<PushEvent<T>>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }
}

impl<T> Stream for SocketIoStream<T> {
    type Item = Result<PushEvent<T>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Run one websocket connection until it closes.
fn session<T, S>(
    ws: S,
    namespace: String,
    entity: EntityName,
) -> impl Stream<Item = Result<PushEvent<T>>> + Send
where
    T: DeserializeOwned + Send + 'static,
    S: Stream<Item = std::result::Result<Message, tokio_tungstenite::tungstenite::Error>>
        + futures_util::Sink<Message, Error = tokio_tungstenite::tungstenite::Error>
        + Send
        + Unpin
        + 'static,
{
    async_stream::stream! {
        let (mut write, mut read) = ws.split();

        while let Some(msg) = read.next().await {
            let text = match msg {
                Ok(Message::Text(text)) => text,
                Ok(Message::Ping(data)) => {
                    trace!("Received ping");
                    if let Err(e) = write.send(Message::Pong(data)).await {
                        warn!(error = %e, "Failed to send pong");
                    }
                    continue;
                }
                Ok(Message::Close(frame)) => {
                    info!(?frame, "WebSocket closed by server");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    yield Err(Error::Transport(TransportError::Connection {
                        message: e.to_string(),
                    }));
                    break;
                }
            };

            let frame = match socketio::decode(text.as_str()) {
                Ok(frame) => frame,
                Err(e) => {
                    yield Err(Error::from(e));
                    continue;
                }
            };

            let reply = match frame {
                Frame::Open(handshake) => {
                    debug!(sid = %handshake.sid, "Engine.IO handshake");
                    Some(socketio::connect_packet(&namespace))
                }
                Frame::Ping => Some(PONG.to_string()),
                Frame::Connect { namespace: joined } => {
                    debug!(namespace = %joined, "Joined namespace");
                    None
                }
                Frame::Event { namespace: ns, name, args, .. } => {
                    if ns == namespace && name == entity.as_str() {
                        yield socketio::push_event(&entity, args).map_err(Error::from);
                    } else {
                        trace!(namespace = %ns, event = %name, "Skipping event");
                    }
                    None
                }
                Frame::ConnectError { message, .. } => {
                    yield Err(Error::Transport(TransportError::Connection {
                        message: message.unwrap_or_else(|| "namespace connection refused".to_string()),
                    }));
                    break;
                }
                Frame::Disconnect { namespace: ns } if ns == namespace => {
                    info!(namespace = %ns, "Disconnected by server");
                    break;
                }
                Frame::Close => break,
                Frame::Disconnect { .. } | Frame::Pong | Frame::Ignored => None,
            };

            if let Some(reply) = reply {
                if let Err(e) = write.send(Message::Text(reply.into())).await {
                    warn!(error = %e, "Failed to write to push channel");
                    yield Err(Error::Transport(TransportError::Connection {
                        message: e.to_string(),
                    }));
                    break;
                }
            }
        }

        let _ = write.close().await;
    }
}
