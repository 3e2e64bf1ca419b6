//! In-memory transport shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use tokio::sync::mpsc;

use parley_bot::application::errors::TransportError;
use parley_bot::application::SessionOptions;
use parley_bot::domain::entities::{ChatMessage, Credentials, Identity};
use parley_bot::domain::traits::{Transport, TransportEvent};

static INIT: Once = Once::new();

pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Records every outbound call; inbound events are pushed through `events()`
pub struct RecordingTransport {
    calls: Mutex<Vec<String>>,
    sent: Mutex<Vec<ChatMessage>>,
    accepted: Mutex<Vec<Identity>>,
    sender: mpsc::UnboundedSender<TransportEvent>,
    receiver: tokio::sync::Mutex<mpsc::UnboundedReceiver<TransportEvent>>,
    closed: AtomicBool,
    fail_auth: bool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Self::build(false)
    }

    pub fn rejecting_auth() -> Arc<Self> {
        Self::build(true)
    }

    fn build(fail_auth: bool) -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            accepted: Mutex::new(Vec::new()),
            sender,
            receiver: tokio::sync::Mutex::new(receiver),
            closed: AtomicBool::new(false),
            fail_auth,
        })
    }

    pub fn push(&self, event: TransportEvent) {
        self.sender.send(event).unwrap();
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<ChatMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_bodies(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.body).collect()
    }

    pub fn accepted(&self) -> Vec<Identity> {
        self.accepted.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        self.record("connect");
        Ok(())
    }

    async fn authenticate(&self, identity: &Identity, _credentials: &Credentials) -> Result<(), TransportError> {
        self.record(format!("authenticate {}", identity));
        if self.fail_auth {
            return Err(TransportError::Auth("bad password".to_string()));
        }
        Ok(())
    }

    async fn accept_subscription(&self, requester: &Identity) -> Result<(), TransportError> {
        self.record(format!("accept {}", requester));
        self.accepted.lock().unwrap().push(requester.clone());
        Ok(())
    }

    async fn send(&self, message: ChatMessage) -> Result<(), TransportError> {
        self.record(format!("send {}", message.to));
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn announce_presence(&self, status: &str) -> Result<(), TransportError> {
        self.record(format!("announce {}", status));
        Ok(())
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        if self.is_closed() {
            return None;
        }
        self.receiver.lock().await.recv().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.record("close");
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub fn options() -> SessionOptions {
    SessionOptions {
        identity: Identity::parse("bot@example.com/home"),
        credentials: Credentials::new("secret"),
        display_name: "Robo".to_string(),
        bootstrap_handlers: vec![Identity::parse("builder@example.com/ci")],
    }
}
