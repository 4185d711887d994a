//! HTTP server
//!
//! Accepts connections on a single loop and serves each one on its own task.
//! Requests are routed to fixed redirects, the in-memory account endpoints or
//! the static file responder.

pub mod accounts;
pub mod config;
pub mod connection;
pub mod mime;
pub mod router;
pub mod static_files;

pub use accounts::AccountStore;
pub use config::ServerConfig;
pub use router::{Route, Router};
pub use static_files::StaticFiles;

use crate::common::ServerTrait;
use crate::{HttpError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, Instrument};

/// HTTP server with an in-memory account store and a static file root
///
/// # Examples
///
/// ```no_run
/// use miniwire::common::ServerTrait;
/// use miniwire::server::{HttpServer, ServerConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ServerConfig::default().with_static_root("public");
///     let server = HttpServer::new(config);
///     let shutdown_signal = server.shutdown_signal();
///
///     let server_handle = tokio::spawn(async move { server.run().await });
///
///     // Serve until something else decides to stop
///     let _ = shutdown_signal.send(());
///     server_handle.await??;
///     Ok(())
/// }
/// ```
pub struct HttpServer {
    config: ServerConfig,
    accounts: Arc<AccountStore>,
    shutdown_signal: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl HttpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_accounts(config, Arc::new(AccountStore::new()))
    }

    /// Creates a server that shares an existing account store
    pub fn with_accounts(config: ServerConfig, accounts: Arc<AccountStore>) -> Self {
        let (shutdown_signal, _) = tokio::sync::broadcast::channel(1);
        Self {
            config,
            accounts,
            shutdown_signal: Arc::new(shutdown_signal),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn accounts(&self) -> Arc<AccountStore> {
        self.accounts.clone()
    }

    /// Runs the accept loop on an already bound listener until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        let router = Arc::new(Router::new(
            self.accounts.clone(),
            StaticFiles::new(&self.config.static_root),
        ));

        info!(
            address = %local_addr,
            static_root = %self.config.static_root.display(),
            "HTTP server listening"
        );

        let connection_count = Arc::new(AtomicUsize::new(0));
        let mut shutdown_rx = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let current = connection_count.fetch_add(1, Ordering::SeqCst) + 1;
                            info!(%addr, current, "Accepted connection");

                            let router = router.clone();
                            let connection_count = connection_count.clone();
                            let deadlines = connection::Deadlines::from(&self.config);
                            let span = tracing::info_span!("connection", %addr);
                            tokio::spawn(async move {
                                let result = connection::handle_connection(stream, addr, &router, deadlines)
                                    .instrument(span)
                                    .await;
                                if let Err(e) = result {
                                    error!(%addr, error = %e, "Error handling connection");
                                }
                                let remaining = connection_count.fetch_sub(1, Ordering::SeqCst) - 1;
                                info!(%addr, current = remaining, "Connection closed");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        info!("HTTP server stopped");
        Ok(())
    }
}

#[async_trait]
impl ServerTrait for HttpServer {
    /// Binds the configured address and serves until shutdown
    async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr)
            .await
            .map_err(|e| HttpError::Config(format!("Failed to bind {}: {e}", self.config.bind_addr)))?;
        self.serve(listener).await
    }

    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }
}
