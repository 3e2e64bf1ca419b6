use async_trait::async_trait;
use crate::application::errors::TransportError;
use crate::domain::entities::{Availability, ChatMessage, Credentials, Identity, InboundMessage};

/// Events delivered by the transport, one at a time
#[derive(Debug, Clone)]
pub enum TransportEvent {
    SubscriptionRequest { requester: Identity },
    Presence { who: Identity, availability: Availability },
    Message(InboundMessage),
}

/// Transport trait - abstraction over the wire-level chat protocol
///
/// Every call may block on I/O; no timeout is imposed by the session.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the connection to the server
    async fn connect(&self) -> Result<(), TransportError>;

    /// Authenticate the connected stream
    async fn authenticate(&self, identity: &Identity, credentials: &Credentials) -> Result<(), TransportError>;

    /// Confirm a pending subscription request
    async fn accept_subscription(&self, requester: &Identity) -> Result<(), TransportError>;

    /// Send a chat-type message
    async fn send(&self, message: ChatMessage) -> Result<(), TransportError>;

    /// Broadcast our own presence with a status text
    async fn announce_presence(&self, status: &str) -> Result<(), TransportError>;

    /// Wait for the next inbound event. `None` once the stream has ended.
    async fn next_event(&self) -> Option<TransportEvent>;

    /// Close the connection
    async fn close(&self) -> Result<(), TransportError>;
}
