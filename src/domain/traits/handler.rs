use async_trait::async_trait;

/// Handler trait - anything that turns a command string into a result string
///
/// Handlers validate their own input; the router passes commands through
/// unmodified.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, command: &str) -> String;
}

