use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::state::SessionState;
use crate::domain::traits::Handler;

/// Reply used when no handler is registered under a key
pub fn missing_handler_message(key: &str) -> String {
    format!("No Handler with name {} Found for your request!", key)
}

/// The session's own default handling: log receipt and echo the command.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, command: &str) -> String {
        info!("Handling the string {}", command);
        command.to_string()
    }
}

/// Registry of handlers keyed by short identity or symbolic name
#[derive(Clone)]
pub struct HandlerRegistry {
    state: Arc<SessionState>,
}

impl HandlerRegistry {
    pub fn new(state: Arc<SessionState>) -> Self {
        Self { state }
    }

    /// Register a handler. An existing entry under the same key is replaced.
    pub fn register(&self, key: impl Into<String>, handler: Arc<dyn Handler>) {
        let key = key.into();
        if self.state.insert_handler(&key, handler).is_some() {
            debug!("Replaced handler: {}", key);
        } else {
            info!("Registered handler: {}", key);
        }
    }

    /// Invoke the handler under `key`, or describe the miss.
    ///
    /// The lock is released before the handler runs, so a slow (remote)
    /// handler never blocks presence or message processing.
    pub async fn invoke(&self, key: &str, command: &str) -> String {
        match self.state.handler(key) {
            Some(handler) => handler.handle(command).await,
            None => {
                debug!("No handler for {}", key);
                missing_handler_message(key)
            }
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.handler_keys()
    }

    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl Handler for Fixed {
        async fn handle(&self, _command: &str) -> String {
            self.0.to_string()
        }
    }

    fn registry() -> HandlerRegistry {
        HandlerRegistry::new(Arc::new(SessionState::new()))
    }

    #[tokio::test]
    async fn test_miss_names_the_key() {
        let registry = registry();
        assert!(registry.is_empty());
        let reply = registry.invoke("nobody", "cmd").await;
        assert_eq!(reply, "No Handler with name nobody Found for your request!");
    }

    #[tokio::test]
    async fn test_result_is_returned_untransformed() {
        let registry = registry();
        registry.register("alice@example.com", Arc::new(Fixed("  pong\n")));
        assert_eq!(registry.invoke("alice@example.com", "ping").await, "  pong\n");
    }

    #[tokio::test]
    async fn test_reregistration_overwrites() {
        let registry = registry();
        registry.register("k", Arc::new(Fixed("first")));
        registry.register("k", Arc::new(Fixed("second")));
        assert_eq!(registry.keys(), vec!["k".to_string()]);
        assert_eq!(registry.invoke("k", "x").await, "second");
    }

    #[tokio::test]
    async fn test_echo_handler_returns_command() {
        let registry = registry();
        registry.register("self", Arc::new(EchoHandler));
        assert_eq!(registry.invoke("self", " raw  input").await, " raw  input");
    }
}
