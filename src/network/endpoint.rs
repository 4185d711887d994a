use crate::HttpError;
use std::fmt;
use std::str::FromStr;

/// The only scheme the parser accepts
pub const SCHEME: &str = "http://";

/// Port used when a URL does not name one
pub const DEFAULT_PORT: u16 = 80;

/// Parsed `(host, port, path)` triple of an `http://` URL
///
/// The `Display` form is the canonical URL `http://host:port/path`, which is
/// also the key the client uses for its revalidation cache.
///
/// # Examples
///
/// ```
/// use miniwire::network::EndpointRef;
///
/// let endpoint: EndpointRef = "http://localhost:8080/index.html".parse().unwrap();
/// assert_eq!(endpoint.host(), "localhost");
/// assert_eq!(endpoint.port(), 8080);
/// assert_eq!(endpoint.path(), "/index.html");
///
/// let bare = EndpointRef::parse("http://example.com").unwrap();
/// assert_eq!(bare.to_string(), "http://example.com:80/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointRef {
    host: String,
    port: u16,
    path: String,
}

impl EndpointRef {
    /// Parses an absolute `http://host[:port][/path]` URL
    pub fn parse(url: &str) -> Result<Self, HttpError> {
        let rest = url
            .strip_prefix(SCHEME)
            .ok_or_else(|| HttpError::Parse(format!("URL must start with {SCHEME}: {url}")))?;

        let slash = rest.find('/');
        // A colon only introduces a port when it comes before the path
        let port_colon = rest.find(':').filter(|&c| slash.is_none_or(|s| c < s));

        if let Some(c) = port_colon {
            let host = &rest[..c];
            let port_and_path = &rest[c + 1..];
            let (port, path) = match port_and_path.find('/') {
                Some(end) => (&port_and_path[..end], &port_and_path[end..]),
                None => (port_and_path, "/"),
            };
            let port = port
                .parse::<u16>()
                .map_err(|e| HttpError::Parse(format!("Invalid port '{port}' in {url}: {e}")))?;
            return Ok(Self::new(host, port, path));
        }

        match slash {
            Some(s) => Ok(Self::new(&rest[..s], DEFAULT_PORT, &rest[s..])),
            None => Ok(Self::new(rest, DEFAULT_PORT, "/")),
        }
    }

    /// Builds an endpoint from its parts; a path without a leading `/` gets one
    pub fn new(host: impl Into<String>, port: u16, path: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            host: host.into(),
            port,
            path,
        }
    }

    /// Returns a copy of this endpoint pointing at another absolute path
    /// on the same host and port
    pub fn with_path(&self, path: &str) -> Self {
        Self::new(self.host.clone(), self.port, path)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value sent in the `Host` request header
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME}{}:{}{}", self.host, self.port, self.path)
    }
}

impl FromStr for EndpointRef {
    type Err = HttpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_port_and_path() {
        let endpoint = EndpointRef::parse("http://localhost:8080/index.html").unwrap();
        assert_eq!(endpoint.host(), "localhost");
        assert_eq!(endpoint.port(), 8080);
        assert_eq!(endpoint.path(), "/index.html");
    }

    #[test]
    fn test_host_and_port_without_path() {
        let endpoint = EndpointRef::parse("http://localhost:8080").unwrap();
        assert_eq!(endpoint.host(), "localhost");
        assert_eq!(endpoint.port(), 8080);
        assert_eq!(endpoint.path(), "/");
    }

    #[test]
    fn test_host_and_path_without_port() {
        let endpoint = EndpointRef::parse("http://example.com/a/b?x=1").unwrap();
        assert_eq!(endpoint.host(), "example.com");
        assert_eq!(endpoint.port(), DEFAULT_PORT);
        assert_eq!(endpoint.path(), "/a/b?x=1");
    }

    #[test]
    fn test_bare_host() {
        let endpoint = EndpointRef::parse("http://example.com").unwrap();
        assert_eq!(endpoint.host(), "example.com");
        assert_eq!(endpoint.port(), 80);
        assert_eq!(endpoint.path(), "/");
    }

    #[test]
    fn test_colon_after_slash_belongs_to_path() {
        let endpoint = EndpointRef::parse("http://example.com/time:now").unwrap();
        assert_eq!(endpoint.host(), "example.com");
        assert_eq!(endpoint.port(), 80);
        assert_eq!(endpoint.path(), "/time:now");
    }

    #[test]
    fn test_rejects_other_schemes_and_relative_urls() {
        assert!(matches!(EndpointRef::parse("https://example.com"), Err(HttpError::Parse(_))));
        assert!(matches!(EndpointRef::parse("/new.html"), Err(HttpError::Parse(_))));
        assert!(matches!(EndpointRef::parse("example.com:80/"), Err(HttpError::Parse(_))));
    }

    #[test]
    fn test_rejects_bad_ports() {
        assert!(EndpointRef::parse("http://localhost:abc/").is_err());
        assert!(EndpointRef::parse("http://localhost:/").is_err());
        assert!(EndpointRef::parse("http://localhost:-1").is_err());
        assert!(EndpointRef::parse("http://localhost:70000").is_err());
        assert!(EndpointRef::parse("http://localhost:8o80").is_err());
    }

    #[test]
    fn test_canonical_display_round_trips() {
        let endpoint = EndpointRef::parse("http://example.com/docs").unwrap();
        assert_eq!(endpoint.to_string(), "http://example.com:80/docs");
        let reparsed: EndpointRef = endpoint.to_string().parse().unwrap();
        assert_eq!(reparsed, endpoint);
    }

    #[test]
    fn test_with_path_keeps_authority() {
        let endpoint = EndpointRef::parse("http://localhost:8080/old").unwrap();
        let moved = endpoint.with_path("/new.html");
        assert_eq!(moved.authority(), "localhost:8080");
        assert_eq!(moved.path(), "/new.html");
    }
}
