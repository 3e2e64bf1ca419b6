//! Remote-invocation gateway
//!
//! Lets other processes on the same host send messages through the running
//! session, register handlers that live outside it, and invoke handlers.

pub mod client;
pub mod protocol;
pub mod remote_handler;
pub mod server;

pub use client::GatewayClient;
pub use protocol::{GatewayRequest, GatewayResponse};
pub use remote_handler::{HandlerEndpoint, RemoteHandler};
pub use server::{handle_request, RemoteInvocationGateway, RemoteSurface};
