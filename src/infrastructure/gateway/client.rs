//! Gateway client used by other processes to drive a running session

use std::path::Path;
use tokio::io::BufReader;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;

use super::protocol::{read_message, write_message, GatewayRequest, GatewayResponse};
use crate::application::errors::GatewayError;
use crate::domain::entities::PresenceStatus;

/// A persistent connection to a session's gateway
pub struct GatewayClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl GatewayClient {
    pub async fn connect(socket_path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let stream = UnixStream::connect(socket_path.as_ref()).await?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// Send one request and wait for its response. Error responses become
    /// [`GatewayError::Remote`].
    pub async fn request(&mut self, request: &GatewayRequest) -> Result<GatewayResponse, GatewayError> {
        write_message(&mut self.writer, request).await?;
        match read_message(&mut self.reader).await? {
            Some(GatewayResponse::Error { message }) => Err(GatewayError::Remote(message)),
            Some(response) => Ok(response),
            None => Err(GatewayError::Closed),
        }
    }

    pub async fn send_message(&mut self, to: &str, body: &str) -> Result<(), GatewayError> {
        let request = GatewayRequest::SendMessage {
            to: to.to_string(),
            body: body.to_string(),
        };
        self.expect_ack(&request).await
    }

    /// Register a handler served at `endpoint` (see `HandlerEndpoint`)
    pub async fn register_handler(&mut self, key: &str, endpoint: impl AsRef<Path>) -> Result<(), GatewayError> {
        let request = GatewayRequest::RegisterHandler {
            key: key.to_string(),
            endpoint: endpoint.as_ref().to_path_buf(),
        };
        self.expect_ack(&request).await
    }

    pub async fn invoke(&mut self, key: &str, command: &str) -> Result<String, GatewayError> {
        let request = GatewayRequest::Invoke {
            key: key.to_string(),
            command: command.to_string(),
        };
        self.expect_output(&request).await
    }

    pub async fn handle(&mut self, command: &str) -> Result<String, GatewayError> {
        let request = GatewayRequest::Handle {
            command: command.to_string(),
        };
        self.expect_output(&request).await
    }

    pub async fn presence(&mut self, jid: &str) -> Result<PresenceStatus, GatewayError> {
        let request = GatewayRequest::Presence { jid: jid.to_string() };
        match self.request(&request).await? {
            GatewayResponse::Presence { status, .. } => match status.as_str() {
                "online" => Ok(PresenceStatus::Online),
                "offline" => Ok(PresenceStatus::Offline),
                "unknown" => Ok(PresenceStatus::Unknown),
                other => Err(GatewayError::Protocol(format!("Unknown presence status: {}", other))),
            },
            other => Err(unexpected(other)),
        }
    }

    /// Ask the session to log out. The session may exit before its
    /// acknowledgement is flushed, so a closed connection also counts as done.
    pub async fn logout(&mut self) -> Result<(), GatewayError> {
        match self.expect_ack(&GatewayRequest::Logout).await {
            Err(GatewayError::Closed) => Ok(()),
            Err(GatewayError::Io(e)) if e.kind() == std::io::ErrorKind::ConnectionReset => Ok(()),
            result => result,
        }
    }

    async fn expect_ack(&mut self, request: &GatewayRequest) -> Result<(), GatewayError> {
        match self.request(request).await? {
            GatewayResponse::Ack => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    async fn expect_output(&mut self, request: &GatewayRequest) -> Result<String, GatewayError> {
        match self.request(request).await? {
            GatewayResponse::Output { output } => Ok(output),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: GatewayResponse) -> GatewayError {
    GatewayError::Protocol(format!("Unexpected response: {:?}", response))
}
