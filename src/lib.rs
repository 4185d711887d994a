use thiserror::Error;

/// Error types for the miniwire library
#[derive(Error, Debug)]
pub enum HttpError {
    /// Malformed URL or redirect `Location`
    #[error("Invalid URL: {0}")]
    Parse(String),

    /// Unreadable or malformed status/request line or header value
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A redirect response without a usable `Location`
    #[error("Redirect error: {0}")]
    Redirect(String),

    /// Redirects were still pending after the exchange budget ran out
    #[error("Exceeded maximum redirects ({0})")]
    RedirectLoop(usize),

    /// Host name did not resolve
    #[error("Unknown host: {0}")]
    UnknownHost(String),

    /// Transport failure (connect, read, write, timeout)
    #[error("Connection failed: {0}")]
    Connection(#[from] std::io::Error),

    /// Failure while handling a request on the server
    #[error("{0}")]
    ServerInternal(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for the miniwire library
pub type Result<T> = std::result::Result<T, HttpError>;

pub mod client;
pub mod codec;
pub mod common;
pub mod network;
pub mod server;

// Re-export main types for convenience
pub use client::{ClientConfig, FetchResult, HttpClient, RevalidationCache};
pub use codec::{HttpMessage, HttpRequest, HttpResponse};
pub use common::ServerTrait;
pub use network::EndpointRef;
pub use server::{AccountStore, HttpServer, ServerConfig};
