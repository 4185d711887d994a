use crate::Result;
use async_trait::async_trait;

/// Common interface for servers that run until told to stop
#[async_trait]
pub trait ServerTrait {
    /// Binds and serves connections until a shutdown signal arrives
    async fn run(&self) -> Result<()>;

    /// Returns a sender that gracefully stops [`ServerTrait::run`] when signalled
    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()>;
}
