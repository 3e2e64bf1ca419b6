//! Session manager - Connection lifecycle and event wiring
//!
//! A session is started once, publishes itself (optionally) through the
//! remote-invocation gateway, and then parks its owner in [`SessionManager::run`]
//! until [`SessionManager::logout`] is called from a message, the gateway, or
//! the end of the transport's event stream.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::application::errors::SessionError;
use crate::application::messaging::{MessageParser, MessageRouter, Outcome};
use crate::application::services::{EchoHandler, HandlerRegistry, PresenceTracker};
use crate::application::state::SessionState;
use crate::domain::entities::{ChatMessage, Credentials, Decision, Identity, PresenceStatus};
use crate::domain::traits::{Handler, Transport, TransportEvent};

/// Everything needed to bring a session up
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub identity: Identity,
    pub credentials: Credentials,
    pub display_name: String,
    /// Identities registered against the session's own handler at startup
    pub bootstrap_handlers: Vec<Identity>,
}

/// The single chat session of this process
pub struct SessionManager {
    identity: Identity,
    transport: Arc<dyn Transport>,
    presence: PresenceTracker,
    registry: HandlerRegistry,
    router: MessageRouter,
    shutdown: watch::Sender<bool>,
    logged_out: AtomicBool,
}

impl SessionManager {
    /// Connect, authenticate, register the bootstrap handlers and announce
    /// presence. Transport failures here are fatal.
    pub async fn start(
        transport: Arc<dyn Transport>,
        options: SessionOptions,
    ) -> Result<Arc<Self>, SessionError> {
        transport.connect().await?;
        transport
            .authenticate(&options.identity, &options.credentials)
            .await?;
        info!("Authenticated as {}", options.identity);

        let state = Arc::new(SessionState::new());
        let registry = HandlerRegistry::new(state.clone());
        let presence = PresenceTracker::new(options.identity.domain(), state.clone());
        let router = MessageRouter::new(MessageParser::default(), registry.clone(), state);
        let (shutdown, _) = watch::channel(false);

        let session = Self {
            identity: options.identity.clone(),
            transport,
            presence,
            registry,
            router,
            shutdown,
            logged_out: AtomicBool::new(false),
        };

        // The session always resolves itself
        session
            .registry
            .register(session.identity.short(), Arc::new(EchoHandler));
        for id in &options.bootstrap_handlers {
            session.registry.register(id.short(), Arc::new(EchoHandler));
        }

        let status = format!(
            "{} is now online at {}",
            options.display_name,
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        session.transport.announce_presence(&status).await?;
        info!("{}", status);

        Ok(Arc::new(session))
    }

    /// Process transport events until logout. Events are handled one at a
    /// time on a dedicated task while the caller stays parked here.
    pub async fn run(self: &Arc<Self>) {
        let pump = tokio::spawn({
            let session = self.clone();
            async move { session.pump_events().await }
        });

        self.wait_for_logout().await;
        pump.abort();
        info!("Session for {} ended", self.identity);
    }

    async fn pump_events(&self) {
        while let Some(event) = self.transport.next_event().await {
            if self.is_logged_out() {
                break;
            }
            self.dispatch(event).await;
        }

        if !self.is_logged_out() {
            warn!("Transport event stream ended");
            self.logout().await;
        }
    }

    /// Handle a single transport event
    pub async fn dispatch(&self, event: TransportEvent) {
        match event {
            TransportEvent::SubscriptionRequest { requester } => {
                if self.presence.on_subscription_request(&requester) == Decision::Accept {
                    if let Err(e) = self.transport.accept_subscription(&requester).await {
                        warn!("Failed to accept subscription from {}: {}", requester, e);
                    }
                }
            }
            TransportEvent::Presence { who, availability } => {
                self.presence.on_presence(&who, availability);
            }
            TransportEvent::Message(message) => {
                for outcome in self.router.route(&message).await {
                    match outcome {
                        Outcome::Reply(reply) => self.deliver(reply).await,
                        Outcome::Logout => self.logout().await,
                    }
                }
            }
        }
    }

    /// Wait until logout has been signalled
    pub async fn wait_for_logout(&self) {
        let mut rx = self.shutdown.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Close the transport and wake the owner. Only the first call has an effect.
    pub async fn logout(&self) {
        if self.logged_out.swap(true, Ordering::SeqCst) {
            debug!("Logout already in progress");
            return;
        }
        info!("Logging out {}", self.identity);
        if let Err(e) = self.transport.close().await {
            warn!("Failed to close transport: {}", e);
        }
        self.shutdown.send_replace(true);
    }

    pub fn is_logged_out(&self) -> bool {
        self.logged_out.load(Ordering::SeqCst)
    }

    /// Send a chat message. Failures are logged, not returned.
    pub async fn send_message(&self, to: &Identity, body: &str) {
        info!("Sending message to {}", to);
        self.deliver(ChatMessage::new(to.clone(), body)).await;
    }

    async fn deliver(&self, message: ChatMessage) {
        let to = message.to.clone();
        if let Err(e) = self.transport.send(message).await {
            warn!("Failed to send message to {}: {}", to, e);
        }
    }

    pub fn register_handler(&self, key: impl Into<String>, handler: Arc<dyn Handler>) {
        self.registry.register(key, handler);
    }

    pub async fn invoke(&self, key: &str, command: &str) -> String {
        self.registry.invoke(key, command).await
    }

    pub fn presence_of(&self, who: &Identity) -> PresenceStatus {
        self.presence.is_online(who)
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }
}

#[async_trait]
impl Handler for SessionManager {
    async fn handle(&self, command: &str) -> String {
        EchoHandler.handle(command).await
    }
}
