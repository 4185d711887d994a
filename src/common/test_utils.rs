use crate::common::ServerTrait;
use crate::server::{HttpServer, ServerConfig};
use crate::{HttpError, Result};
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// A server running on a loopback port for tests
pub struct TestServer {
    pub addr: SocketAddr,
    pub handle: JoinHandle<Result<()>>,
    pub shutdown: broadcast::Sender<()>,
}

impl TestServer {
    /// Base URL of the server, e.g. `http://127.0.0.1:41234`
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Signals shutdown and waits for the accept loop to finish
    pub async fn stop(self) -> Result<()> {
        if self.shutdown.send(()).is_err() {
            // The accept loop has not subscribed yet
            self.handle.abort();
            return Ok(());
        }
        self.handle
            .await
            .map_err(|e| HttpError::Config(format!("Server task failed: {e}")))?
    }
}

/// Starts an [`HttpServer`] serving `static_root` on an ephemeral loopback port
///
/// The listener is bound before this returns, so requests can be sent
/// immediately.
pub async fn spawn_test_server(static_root: &Path) -> Result<TestServer> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|e| HttpError::Config(format!("Failed to bind listener: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| HttpError::Config(format!("Failed to get local address: {e}")))?;

    let server = HttpServer::new(ServerConfig::new(addr).with_static_root(static_root));
    let shutdown = server.shutdown_signal();
    let handle = tokio::spawn(async move { server.serve(listener).await });

    Ok(TestServer {
        addr,
        handle,
        shutdown,
    })
}
