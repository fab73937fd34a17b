// jujuact-api: Async Rust client for the Juju controller WebSocket RPC API

pub mod error;
pub mod rpc;
pub mod transport;
pub mod websocket;

pub use error::Error;
pub use rpc::models;
pub use rpc::{RpcRequest, RpcSession, decode};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::WsSession;
