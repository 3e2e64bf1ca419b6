//! Handlers that live in another process
//!
//! [`HandlerEndpoint`] serves a local handler on a socket; [`RemoteHandler`]
//! is what the session registers for it. Each invocation opens a fresh
//! connection, so an endpoint can be restarted without re-registering.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use super::protocol::{read_message, write_message, GatewayRequest, GatewayResponse};
use super::server::bind_socket;
use crate::application::errors::GatewayError;
use crate::domain::traits::Handler;

/// Proxy for a handler served by another process
#[derive(Debug, Clone)]
pub struct RemoteHandler {
    endpoint: PathBuf,
}

impl RemoteHandler {
    pub fn new(endpoint: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &Path {
        &self.endpoint
    }

    async fn call(&self, command: &str) -> Result<String, GatewayError> {
        let stream = UnixStream::connect(&self.endpoint).await?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let request = GatewayRequest::Handle {
            command: command.to_string(),
        };
        write_message(&mut writer, &request).await?;

        match read_message(&mut reader).await? {
            Some(GatewayResponse::Output { output }) => Ok(output),
            Some(GatewayResponse::Error { message }) => Err(GatewayError::Remote(message)),
            Some(other) => Err(GatewayError::Protocol(format!("Unexpected response: {:?}", other))),
            None => Err(GatewayError::Protocol("Endpoint closed the connection".to_string())),
        }
    }
}

#[async_trait]
impl Handler for RemoteHandler {
    async fn handle(&self, command: &str) -> String {
        match self.call(command).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Remote handler at {} failed: {}", self.endpoint.display(), e);
                format!("Remote handler at {} failed: {}", self.endpoint.display(), e)
            }
        }
    }
}

/// Serves a local handler to sessions in other processes
pub struct HandlerEndpoint {
    socket_path: PathBuf,
    listener: UnixListener,
    handler: Arc<dyn Handler>,
}

impl HandlerEndpoint {
    pub async fn bind(
        socket_path: impl Into<PathBuf>,
        handler: Arc<dyn Handler>,
    ) -> Result<Self, GatewayError> {
        let socket_path = socket_path.into();
        let listener = bind_socket(&socket_path).await?;
        info!("Handler endpoint listening on {}", socket_path.display());
        Ok(Self {
            socket_path,
            listener,
            handler,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub async fn serve(&self) -> Result<(), GatewayError> {
        loop {
            let (stream, _) = self.listener.accept().await?;
            let handler = self.handler.clone();
            tokio::spawn(async move {
                if let Err(e) = answer(stream, handler).await {
                    warn!("Handler endpoint connection error: {}", e);
                }
            });
        }
    }
}

impl Drop for HandlerEndpoint {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn answer(stream: UnixStream, handler: Arc<dyn Handler>) -> Result<(), GatewayError> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    while let Some(request) = read_message::<GatewayRequest, _>(&mut reader).await? {
        let response = match request {
            GatewayRequest::Handle { command } => {
                debug!("Endpoint handling: {}", command);
                GatewayResponse::Output {
                    output: handler.handle(&command).await,
                }
            }
            other => GatewayResponse::Error {
                message: format!("Handler endpoints only answer handle requests, got {:?}", other),
            },
        };
        write_message(&mut writer, &response).await?;
    }
    Ok(())
}
