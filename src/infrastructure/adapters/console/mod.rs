//! Console transport for development/testing
//!
//! Reads simulated protocol events from stdin, one per line:
//!
//! ```text
//! alice@example.com/phone: hello     message from alice
//! !error alice@example.com: boom     error-type message
//! !online alice@example.com          presence available
//! !offline alice@example.com         presence unavailable
//! !presence alice@example.com        presence without availability
//! !subscribe bob@example.com         subscription request
//! ```
//!
//! Outbound traffic is printed to stdout.

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::application::errors::TransportError;
use crate::domain::entities::{Availability, ChatMessage, Credentials, Identity, InboundMessage};
use crate::domain::traits::{Transport, TransportEvent};

/// Console transport adapter for local development
pub struct ConsoleTransport {
    sender: Mutex<Option<mpsc::Sender<TransportEvent>>>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<TransportEvent>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(64);
        Self {
            sender: Mutex::new(Some(tx)),
            receiver: tokio::sync::Mutex::new(rx),
            reader: Mutex::new(None),
        }
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one console line into an event. Blank lines and lines without a
/// sender yield `None`.
pub fn parse_line(line: &str) -> Option<TransportEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(rest) = line.strip_prefix('!') {
        let (verb, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let arg = arg.trim();
        return match verb {
            "online" => presence(arg, Availability::Available),
            "offline" => presence(arg, Availability::Unavailable),
            "presence" => presence(arg, Availability::Unspecified),
            "subscribe" if !arg.is_empty() => Some(TransportEvent::SubscriptionRequest {
                requester: Identity::parse(arg),
            }),
            "error" => {
                let (from, body) = arg.split_once(':')?;
                Some(TransportEvent::Message(InboundMessage::error(from, body.trim_start())))
            }
            _ => None,
        };
    }

    let (from, body) = line.split_once(':')?;
    if from.trim().is_empty() {
        return None;
    }
    Some(TransportEvent::Message(InboundMessage::new(from, body.trim_start())))
}

fn presence(who: &str, availability: Availability) -> Option<TransportEvent> {
    if who.is_empty() {
        return None;
    }
    Some(TransportEvent::Presence {
        who: Identity::parse(who),
        availability,
    })
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let tx = self
            .sender
            .lock()
            .map_err(|_| TransportError::Connect("Lock poisoned".to_string()))?
            .take()
            .ok_or_else(|| TransportError::Connect("Already connected".to_string()))?;

        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                match parse_line(&line) {
                    Some(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    None if !line.trim().is_empty() => {
                        warn!("Unrecognised console input: {}", line);
                    }
                    None => {}
                }
            }
        });

        if let Ok(mut reader) = self.reader.lock() {
            *reader = Some(handle);
        }
        info!("Console transport connected (dev mode)");
        Ok(())
    }

    async fn authenticate(&self, identity: &Identity, _credentials: &Credentials) -> Result<(), TransportError> {
        debug!("Console transport accepts any credentials for {}", identity);
        Ok(())
    }

    async fn accept_subscription(&self, requester: &Identity) -> Result<(), TransportError> {
        println!("[SUBSCRIBED] {}", requester);
        Ok(())
    }

    async fn send(&self, message: ChatMessage) -> Result<(), TransportError> {
        println!("[BOT -> {}] {}", message.to, message.body);
        Ok(())
    }

    async fn announce_presence(&self, status: &str) -> Result<(), TransportError> {
        println!("[PRESENCE] {}", status);
        Ok(())
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        self.receiver.lock().await.recv().await
    }

    async fn close(&self) -> Result<(), TransportError> {
        // Dropping the reader drops the sender, which ends the event stream
        if let Some(handle) = self.reader.lock().ok().and_then(|mut r| r.take()) {
            handle.abort();
        }
        info!("Console transport closed");
        Ok(())
    }
}
