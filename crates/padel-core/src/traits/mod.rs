//! Seams to the remote backend.

mod gateway;
mod push;

pub use gateway::Gateway;
pub use push::{PushChannel, PushStream};
