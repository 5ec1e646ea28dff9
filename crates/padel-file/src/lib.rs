//! padel-file - Filesystem-backed gateway and push channel.
//!
//! Stores records as JSON documents under a root directory and publishes
//! every create and update to an append-only log that push subscribers
//! tail. Useful for working offline and for tests.

mod gateway;
mod push;
mod store;

pub use gateway::FileGateway;
pub use push::{FilePushChannel, FilePushStream};
pub use store::FileStore;
