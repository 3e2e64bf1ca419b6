//! Protocol types for the remote-invocation gateway.
//!
//! All communication uses newline-delimited JSON (one JSON object per line).
//! Connections are persistent with multiple request/response exchanges per
//! connection. Out-of-process handlers speak the same protocol but only
//! answer `Handle`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::application::errors::GatewayError;

/// Requests accepted by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayRequest {
    /// Push a chat message without going through the protocol
    SendMessage { to: String, body: String },
    /// Register a handler that is served at `endpoint` by another process
    RegisterHandler { key: String, endpoint: PathBuf },
    /// Invoke a registered handler
    Invoke { key: String, command: String },
    /// The session's own default handling
    Handle { command: String },
    /// Query what is known about a contact
    Presence { jid: String },
    Logout,
}

/// Responses sent back, one per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayResponse {
    Ack,
    Output { output: String },
    Presence { jid: String, status: String },
    Error { message: String },
}

/// Read one JSON line. `Ok(None)` on EOF.
pub async fn read_message<T, R>(reader: &mut R) -> Result<Option<T>, GatewayError>
where
    T: DeserializeOwned,
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line.trim_end())?))
}

/// Write one value as a JSON line
pub async fn write_message<T, W>(writer: &mut W, message: &T) -> Result<(), GatewayError>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let mut json = serde_json::to_string(message)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}
