use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Port the server listens on unless told otherwise
pub const DEFAULT_PORT: u16 = 8080;

/// Directory static resources are served from unless told otherwise
pub const DEFAULT_STATIC_ROOT: &str = "static";

/// Configuration for the HTTP server
///
/// # Examples
///
/// ```
/// use miniwire::server::ServerConfig;
/// use std::time::Duration;
///
/// let config = ServerConfig::new("127.0.0.1:9000".parse().unwrap())
///     .with_static_root("public")
///     .with_read_timeout(Duration::from_secs(30))
///     .with_write_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.static_root.to_str(), Some("public"));
/// assert_eq!(config.read_timeout, Some(Duration::from_secs(30)));
/// assert_eq!(config.write_timeout, Some(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Root directory for static resources
    pub static_root: PathBuf,
    /// How long to wait for the next request on a connection
    /// (None waits for as long as the peer stays silent)
    pub read_timeout: Option<Duration>,
    /// How long writing one response may take before the peer is dropped
    pub write_timeout: Option<Duration>,
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            static_root: PathBuf::from(DEFAULT_STATIC_ROOT),
            read_timeout: None,
            write_timeout: None,
        }
    }

    pub fn with_static_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.static_root = root.into();
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))
    }
}
