//! Gateway server
//!
//! Publishes a running session on a Unix socket so another process on the
//! same host can drive it. Every request is passed straight through to the
//! session; the gateway itself holds no state beyond the listener.

use async_trait::async_trait;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use super::protocol::{read_message, write_message, GatewayRequest, GatewayResponse};
use super::remote_handler::RemoteHandler;
use crate::application::errors::GatewayError;
use crate::application::SessionManager;
use crate::domain::entities::{Identity, PresenceStatus};
use crate::domain::traits::Handler;

/// Operations a session exposes to other processes
#[async_trait]
pub trait RemoteSurface: Send + Sync {
    async fn send_message(&self, to: &Identity, body: &str);
    fn register_handler(&self, key: String, handler: Arc<dyn Handler>);
    async fn invoke(&self, key: &str, command: &str) -> String;
    async fn handle(&self, command: &str) -> String;
    fn presence_of(&self, who: &Identity) -> PresenceStatus;
    async fn logout(&self);
}

#[async_trait]
impl RemoteSurface for SessionManager {
    async fn send_message(&self, to: &Identity, body: &str) {
        SessionManager::send_message(self, to, body).await
    }

    fn register_handler(&self, key: String, handler: Arc<dyn Handler>) {
        SessionManager::register_handler(self, key, handler)
    }

    async fn invoke(&self, key: &str, command: &str) -> String {
        SessionManager::invoke(self, key, command).await
    }

    async fn handle(&self, command: &str) -> String {
        Handler::handle(self, command).await
    }

    fn presence_of(&self, who: &Identity) -> PresenceStatus {
        SessionManager::presence_of(self, who)
    }

    async fn logout(&self) {
        SessionManager::logout(self).await
    }
}

/// Bind a Unix socket, replacing a stale socket file but refusing to take
/// over one that still has a listener. Anything at `path` that is not a
/// socket is left alone.
pub(crate) async fn bind_socket(path: &Path) -> Result<UnixListener, GatewayError> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) => {
            if !meta.file_type().is_socket() {
                return Err(GatewayError::Protocol(format!(
                    "{} exists and is not a socket",
                    path.display()
                )));
            }
            if UnixStream::connect(path).await.is_ok() {
                return Err(GatewayError::Protocol(format!(
                    "Socket {} is already in use",
                    path.display()
                )));
            }
            std::fs::remove_file(path)?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(UnixListener::bind(path)?)
}

/// Remote-invocation gateway bound to a socket path
pub struct RemoteInvocationGateway {
    socket_path: PathBuf,
    listener: UnixListener,
    surface: Arc<dyn RemoteSurface>,
}

impl RemoteInvocationGateway {
    pub async fn bind(
        socket_path: impl Into<PathBuf>,
        surface: Arc<dyn RemoteSurface>,
    ) -> Result<Self, GatewayError> {
        let socket_path = socket_path.into();
        let listener = bind_socket(&socket_path).await?;
        info!("Gateway listening on {}", socket_path.display());
        Ok(Self {
            socket_path,
            listener,
            surface,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accept connections until the task is dropped or the listener fails
    pub async fn serve(&self) -> Result<(), GatewayError> {
        loop {
            let (stream, _) = self.listener.accept().await?;
            let surface = self.surface.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_connection(stream, surface).await {
                    warn!("Gateway connection error: {}", e);
                }
            });
        }
    }
}

impl Drop for RemoteInvocationGateway {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn serve_connection(
    stream: UnixStream,
    surface: Arc<dyn RemoteSurface>,
) -> Result<(), GatewayError> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    loop {
        let response = match read_message::<GatewayRequest, _>(&mut reader).await {
            Ok(Some(request)) => handle_request(surface.as_ref(), request).await,
            Ok(None) => break,
            Err(GatewayError::Protocol(message)) => GatewayResponse::Error { message },
            Err(e) => return Err(e),
        };
        write_message(&mut writer, &response).await?;
    }

    debug!("Gateway client disconnected");
    Ok(())
}

/// Map one request onto the session
pub async fn handle_request(surface: &dyn RemoteSurface, request: GatewayRequest) -> GatewayResponse {
    debug!("Gateway request: {:?}", request);
    match request {
        GatewayRequest::SendMessage { to, body } => {
            surface.send_message(&Identity::parse(&to), &body).await;
            GatewayResponse::Ack
        }
        GatewayRequest::RegisterHandler { key, endpoint } => {
            surface.register_handler(key, Arc::new(RemoteHandler::new(endpoint)));
            GatewayResponse::Ack
        }
        GatewayRequest::Invoke { key, command } => GatewayResponse::Output {
            output: surface.invoke(&key, &command).await,
        },
        GatewayRequest::Handle { command } => GatewayResponse::Output {
            output: surface.handle(&command).await,
        },
        GatewayRequest::Presence { jid } => {
            let status = surface.presence_of(&Identity::parse(&jid));
            GatewayResponse::Presence {
                jid,
                status: status.as_str().to_string(),
            }
        }
        GatewayRequest::Logout => {
            surface.logout().await;
            GatewayResponse::Ack
        }
    }
}
