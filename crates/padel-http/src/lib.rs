//! padel-http - REST gateway and socket.io push channel for the padel
//! administration backend.

mod client;
mod gateway;
mod push;
pub mod socketio;

pub use client::RestClient;
pub use gateway::HttpGateway;
pub use push::{SocketIoChannel, SocketIoStream};
