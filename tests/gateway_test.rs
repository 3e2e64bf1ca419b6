//! Remote-invocation gateway tests over real Unix sockets
//! Run with: cargo test --test gateway_test

mod common;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use common::{ensure_init, options, RecordingTransport};
use parley_bot::application::errors::GatewayError;
use parley_bot::application::SessionManager;
use parley_bot::domain::entities::{Availability, Identity, InboundMessage, PresenceStatus};
use parley_bot::domain::traits::{Handler, TransportEvent};
use parley_bot::infrastructure::gateway::{
    GatewayClient, GatewayRequest, GatewayResponse, HandlerEndpoint, RemoteHandler,
    RemoteInvocationGateway,
};

fn socket_path(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("parley-test-{}-{}.sock", tag, uuid::Uuid::new_v4()))
}

struct Shout;

#[async_trait]
impl Handler for Shout {
    async fn handle(&self, command: &str) -> String {
        command.to_uppercase()
    }
}

/// Start a session with its gateway served in the background
async fn published() -> (Arc<RecordingTransport>, Arc<SessionManager>, Arc<RemoteInvocationGateway>) {
    ensure_init();
    let transport = RecordingTransport::new();
    let session = SessionManager::start(transport.clone(), options()).await.unwrap();
    let gateway = Arc::new(
        RemoteInvocationGateway::bind(socket_path("gw"), session.clone())
            .await
            .unwrap(),
    );
    let serving = gateway.clone();
    tokio::spawn(async move { serving.serve().await });
    (transport, session, gateway)
}

#[tokio::test]
async fn test_send_message_through_gateway() {
    let (transport, _session, gateway) = published().await;
    let mut client = GatewayClient::connect(gateway.socket_path()).await.unwrap();

    client.send_message("alice@example.com/phone", "built ok").await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.short(), "alice@example.com");
    assert_eq!(sent[0].body, "built ok");
}

#[tokio::test]
async fn test_invoke_and_handle_through_gateway() {
    let (_transport, _session, gateway) = published().await;
    let mut client = GatewayClient::connect(gateway.socket_path()).await.unwrap();

    assert_eq!(client.handle("status").await.unwrap(), "status");
    assert_eq!(client.invoke("builder@example.com", "make").await.unwrap(), "make");
    assert_eq!(
        client.invoke("nobody", "cmd").await.unwrap(),
        "No Handler with name nobody Found for your request!"
    );
}

#[tokio::test]
async fn test_out_of_process_handler_serves_commands() {
    let (transport, session, gateway) = published().await;

    let endpoint = HandlerEndpoint::bind(socket_path("handler"), Arc::new(Shout))
        .await
        .unwrap();
    let endpoint_path = endpoint.socket_path().to_path_buf();
    tokio::spawn(async move { endpoint.serve().await });

    let mut client = GatewayClient::connect(gateway.socket_path()).await.unwrap();
    client.register_handler("alice@example.com", &endpoint_path).await.unwrap();

    session
        .dispatch(TransportEvent::Message(InboundMessage::new(
            "alice@example.com/laptop",
            "jbrake::ping",
        )))
        .await;

    let reply = transport.sent_bodies().pop().unwrap();
    assert_eq!(reply, "just run ===> ping\n response is ====> PING");
    assert_eq!(client.invoke("alice@example.com", "hey").await.unwrap(), "HEY");
}

#[tokio::test]
async fn test_unreachable_remote_handler_degrades_to_text() {
    ensure_init();
    let handler = RemoteHandler::new(socket_path("missing"));
    let output = handler.handle("ping").await;
    assert!(output.starts_with("Remote handler at "));
    assert!(output.contains("failed"));
}

#[tokio::test]
async fn test_presence_query_through_gateway() {
    let (_transport, session, gateway) = published().await;
    session
        .dispatch(TransportEvent::Presence {
            who: Identity::parse("dave@example.com/x"),
            availability: Availability::Unavailable,
        })
        .await;

    let mut client = GatewayClient::connect(gateway.socket_path()).await.unwrap();
    assert_eq!(client.presence("dave@example.com").await.unwrap(), PresenceStatus::Offline);
    assert_eq!(client.presence("erin@example.com").await.unwrap(), PresenceStatus::Unknown);
}

#[tokio::test]
async fn test_logout_through_gateway_wakes_owner() {
    let (transport, session, gateway) = published().await;
    let owner = tokio::spawn({
        let session = session.clone();
        async move { session.run().await }
    });

    let mut client = GatewayClient::connect(gateway.socket_path()).await.unwrap();
    client.logout().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), owner)
        .await
        .expect("owner should wake up")
        .unwrap();
    assert!(transport.is_closed());
}

#[tokio::test]
async fn test_malformed_request_gets_error_and_connection_survives() {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    let (_transport, _session, gateway) = published().await;
    let stream = tokio::net::UnixStream::connect(gateway.socket_path()).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer.write_all(b"{\"type\":\"dance\"}\n").await.unwrap();
    let line = lines.next_line().await.unwrap().unwrap();
    let response: GatewayResponse = serde_json::from_str(&line).unwrap();
    assert!(matches!(response, GatewayResponse::Error { .. }));

    let request = serde_json::to_string(&GatewayRequest::Handle { command: "still here".into() }).unwrap();
    writer.write_all(format!("{}\n", request).as_bytes()).await.unwrap();
    let line = lines.next_line().await.unwrap().unwrap();
    let response: GatewayResponse = serde_json::from_str(&line).unwrap();
    assert_eq!(response, GatewayResponse::Output { output: "still here".into() });
}

#[tokio::test]
async fn test_second_gateway_on_live_socket_is_refused() {
    let (_transport, session, gateway) = published().await;
    let result = RemoteInvocationGateway::bind(gateway.socket_path(), session.clone()).await;
    assert!(matches!(result, Err(GatewayError::Protocol(_))));
}

#[tokio::test]
async fn test_bind_leaves_regular_file_alone() {
    ensure_init();
    let transport = RecordingTransport::new();
    let session = SessionManager::start(transport, options()).await.unwrap();
    let path = std::env::temp_dir().join(format!("parley-test-notes-{}.txt", uuid::Uuid::new_v4()));
    std::fs::write(&path, "precious user data").unwrap();

    let result = RemoteInvocationGateway::bind(&path, session).await;

    assert!(matches!(result, Err(GatewayError::Protocol(_))));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "precious user data");
    std::fs::remove_file(&path).unwrap();
}

/// Accept one connection, read one request and hang up without replying
async fn hang_up_after_request(path: &Path) {
    use tokio::io::AsyncBufReadExt;

    let listener = tokio::net::UnixListener::bind(path).unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut line = String::new();
        let _ = tokio::io::BufReader::new(stream).read_line(&mut line).await;
    });
}

#[tokio::test]
async fn test_logout_counts_hangup_as_done() {
    let path = socket_path("exiting");
    hang_up_after_request(&path).await;

    let mut client = GatewayClient::connect(&path).await.unwrap();
    assert!(client.logout().await.is_ok());
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_hangup_on_other_requests_is_an_error() {
    let path = socket_path("hangup");
    hang_up_after_request(&path).await;

    let mut client = GatewayClient::connect(&path).await.unwrap();
    let result = client.invoke("builder@example.com", "make").await;
    assert!(matches!(result, Err(GatewayError::Closed)));
    let _ = std::fs::remove_file(&path);
}
