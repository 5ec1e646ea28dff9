//! Push channel traits.

use futures_core::Stream;

use crate::Result;
use crate::record::PushEvent;
use crate::types::EntityName;

/// A live stream of upserts for one entity.
///
/// Items are yielded in receipt order. A decode failure is yielded as an
/// `Err` and does not end the stream; the stream ends when the connection
/// closes. Dropping the stream releases the connection.
pub trait PushStream<T>: Stream<Item = Result<PushEvent<T>>> + Send {}

impl<T, S> PushStream<T> for S where S: Stream<Item = Result<PushEvent<T>>> + Send {}

/// A source of push streams.
pub trait PushChannel<T>: Send + Sync {
    /// Stream type for this channel.
    type Stream: PushStream<T> + 'static;

    /// Subscribe to the named entity's events.
    fn subscribe(&self, entity: &EntityName) -> Result<Self::Stream>;
}
