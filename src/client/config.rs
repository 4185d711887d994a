use std::time::Duration;

/// Upper bound on request/response exchanges for one logical request
pub const MAX_REDIRECT: usize = 3;

/// Configuration for the HTTP client driver
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Connection timeout per hop
    pub connect_timeout: Duration,
    /// Read timeout for a response (None waits for as long as the peer takes)
    pub read_timeout: Option<Duration>,
    /// Exchanges allowed before giving up with a redirect loop error
    pub max_redirects: usize,
    /// Resolve a `Location` of the form `/path` against the current endpoint
    /// instead of rejecting it
    pub follow_relative_locations: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: None,
            max_redirects: MAX_REDIRECT,
            follow_relative_locations: false,
        }
    }
}

/// Builder for client configuration
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = Some(timeout);
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    pub fn follow_relative_locations(mut self, follow: bool) -> Self {
        self.config.follow_relative_locations = follow;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
