//! Message router - Greets new contacts and dispatches by classification

use chrono::Local;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::parser::{MessageParser, Route};
use crate::application::services::HandlerRegistry;
use crate::application::state::SessionState;
use crate::domain::entities::{ChatMessage, InboundMessage};

pub const FIRST_CONTACT_NOTICE: &str = "I am a robot. You are connecting for the first time.";
pub const LOGOUT_ACK: &str = "Exiting ...";

/// Something the session has to do as a result of a message, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Reply(ChatMessage),
    Logout,
}

/// Routes inbound messages. Holds no per-message state; the greeted set
/// lives in the shared session state.
pub struct MessageRouter {
    parser: MessageParser,
    registry: HandlerRegistry,
    state: Arc<SessionState>,
}

impl MessageRouter {
    pub fn new(parser: MessageParser, registry: HandlerRegistry, state: Arc<SessionState>) -> Self {
        Self {
            parser,
            registry,
            state,
        }
    }

    /// Route one message. Never fails: misses and odd input become replies.
    pub async fn route(&self, message: &InboundMessage) -> Vec<Outcome> {
        if message.is_error() {
            warn!("{}: {}", message.kind.as_str(), message.body);
            return Vec::new();
        }

        info!("Received from {}: {}", message.from, message.body);
        let mut outcomes = Vec::with_capacity(2);

        if self.state.mark_greeted(&message.from.short()) {
            debug!("First contact from {}", message.from.short());
            outcomes.push(self.reply(message, FIRST_CONTACT_NOTICE));
        }

        match self.parser.classify(&message.body) {
            Route::Logout => {
                outcomes.push(self.reply(message, LOGOUT_ACK));
                outcomes.push(Outcome::Logout);
            }
            Route::Command(command) => {
                let result = self.registry.invoke(&message.from.short(), &command).await;
                outcomes.push(self.reply(message, command_reply(&command, &result)));
            }
            Route::Generic(body) => {
                outcomes.push(self.reply(message, generic_reply(&body)));
            }
        }

        outcomes
    }

    fn reply(&self, message: &InboundMessage, body: impl Into<String>) -> Outcome {
        Outcome::Reply(ChatMessage::new(message.from.clone(), body))
    }
}

pub fn command_reply(command: &str, result: &str) -> String {
    format!("just run ===> {}\n response is ====> {}", command, result)
}

/// Wrap a body with the local date and time
pub fn generic_reply(body: &str) -> String {
    format!("[{}] *** {}***", Local::now().format("%m/%d/%Y %I:%M%p"), body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::Handler;
    use async_trait::async_trait;

    struct Pong;

    #[async_trait]
    impl Handler for Pong {
        async fn handle(&self, command: &str) -> String {
            if command == "ping" { "pong".into() } else { "?".into() }
        }
    }

    fn router() -> MessageRouter {
        let state = Arc::new(SessionState::new());
        let registry = HandlerRegistry::new(state.clone());
        registry.register("alice@example.com", Arc::new(Pong));
        MessageRouter::new(MessageParser::default(), registry, state)
    }

    fn bodies(outcomes: &[Outcome]) -> Vec<String> {
        outcomes
            .iter()
            .filter_map(|o| match o {
                Outcome::Reply(msg) => Some(msg.body.clone()),
                Outcome::Logout => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_first_message_is_greeted_then_answered() {
        let router = router();
        let outcomes = router.route(&InboundMessage::new("bob@example.com/x", "hello")).await;
        let bodies = bodies(&outcomes);
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0], FIRST_CONTACT_NOTICE);
        assert!(bodies[1].ends_with("*** hello***"));

        let again = router.route(&InboundMessage::new("bob@example.com/y", "hello")).await;
        assert_eq!(again.len(), 1);
    }

    #[tokio::test]
    async fn test_command_reply_contains_command_and_result() {
        let router = router();
        let outcomes = router.route(&InboundMessage::new("alice@example.com/phone", "jbrake::ping")).await;
        let last = bodies(&outcomes).pop().unwrap();
        assert_eq!(last, "just run ===> ping\n response is ====> pong");
    }

    #[tokio::test]
    async fn test_command_without_handler_reports_miss() {
        let router = router();
        let outcomes = router.route(&InboundMessage::new("dave@example.com", "jbrake::ls")).await;
        let last = bodies(&outcomes).pop().unwrap();
        assert!(last.contains("No Handler with name dave@example.com Found"));
    }

    #[tokio::test]
    async fn test_exit_acknowledges_then_logs_out() {
        let router = router();
        router.route(&InboundMessage::new("alice@example.com", "hi")).await;
        let outcomes = router.route(&InboundMessage::new("alice@example.com", "exit")).await;
        assert_eq!(outcomes.len(), 2);
        assert!(matches!(&outcomes[0], Outcome::Reply(m) if m.body == LOGOUT_ACK));
        assert_eq!(outcomes[1], Outcome::Logout);
    }

    #[tokio::test]
    async fn test_error_messages_are_only_logged() {
        let router = router();
        let outcomes = router.route(&InboundMessage::error("alice@example.com", "exit")).await;
        assert!(outcomes.is_empty());
        // not greeted either
        let outcomes = router.route(&InboundMessage::new("alice@example.com", "hi")).await;
        assert_eq!(bodies(&outcomes)[0], FIRST_CONTACT_NOTICE);
    }

    #[test]
    fn test_generic_reply_format() {
        let reply = generic_reply("hey");
        assert!(reply.starts_with('['));
        assert!(reply.ends_with("] *** hey***"));
    }
}
