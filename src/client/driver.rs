use super::cache::RevalidationCache;
use super::config::ClientConfig;
use crate::codec::{build_request, read_response, HttpResponse};
use crate::network::EndpointRef;
use crate::{HttpError, Result};
use http::Method;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Final result of one logical request, after any redirects were followed
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Endpoint that produced `response`
    pub endpoint: EndpointRef,
    /// Redirect targets followed on the way, in order
    pub redirects: Vec<EndpointRef>,
    pub response: HttpResponse,
}

impl FetchResult {
    /// The server confirmed the cached copy is still current
    pub fn is_not_modified(&self) -> bool {
        self.response.status_code == 304
    }
}

/// Progress of a logical request, reported as each exchange happens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopEvent<'a> {
    /// About to send the request to this endpoint
    Sending(&'a EndpointRef),
    /// The last response redirected to this endpoint
    Redirecting(&'a EndpointRef),
}

/// What a single exchange decided about the request as a whole
#[derive(Debug)]
enum HopOutcome {
    Done(HttpResponse),
    Redirecting(EndpointRef),
}

/// HTTP client that opens a fresh connection for every exchange
///
/// Follows 301/302 redirects up to [`ClientConfig::max_redirects`] exchanges
/// and revalidates GETs with `If-Modified-Since` using the `Last-Modified`
/// values it has seen.
///
/// # Examples
///
/// ```no_run
/// use miniwire::client::HttpClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut client = HttpClient::default();
///     let first = client.get("http://localhost:8080/index.html").await?;
///     println!("{} {}", first.response.status_code, first.response.status_message);
///
///     // Sends If-Modified-Since if the first reply carried Last-Modified
///     let second = client.get("http://localhost:8080/index.html").await?;
///     if second.is_not_modified() {
///         println!("resource unmodified");
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Default)]
pub struct HttpClient {
    config: ClientConfig,
    cache: RevalidationCache,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            cache: RevalidationCache::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &RevalidationCache {
        &self.cache
    }

    /// Issues a GET for `url`
    pub async fn get(&mut self, url: &str) -> Result<FetchResult> {
        let target = EndpointRef::parse(url)?;
        self.send(Method::GET, target, "").await
    }

    /// Issues a form-encoded POST of `form` to `url`
    pub async fn post(&mut self, url: &str, form: &str) -> Result<FetchResult> {
        let target = EndpointRef::parse(url)?;
        self.send(Method::POST, target, form).await
    }

    /// Runs the redirect loop for one logical request
    pub async fn send(
        &mut self,
        method: Method,
        target: EndpointRef,
        body: &str,
    ) -> Result<FetchResult> {
        self.send_observed(method, target, body, |_| {}).await
    }

    /// Like [`send`](Self::send), calling `observe` before every exchange and
    /// on every redirect, including those of a request that ends in an error
    pub async fn send_observed<F>(
        &mut self,
        method: Method,
        target: EndpointRef,
        body: &str,
        mut observe: F,
    ) -> Result<FetchResult>
    where
        F: FnMut(HopEvent<'_>),
    {
        let mut current = target;
        let mut redirects = Vec::new();

        for hop in 0..self.config.max_redirects {
            info!(hop, %method, target = %current, "Sending request");
            observe(HopEvent::Sending(&current));
            let response = self.exchange(&method, &current, body).await?;
            info!(
                hop,
                status = response.status_code,
                message = %response.status_message,
                "Received response"
            );

            match self.classify(&current, response)? {
                HopOutcome::Done(response) => {
                    return Ok(FetchResult {
                        endpoint: current,
                        redirects,
                        response,
                    });
                }
                HopOutcome::Redirecting(next) => {
                    info!(hop, from = %current, to = %next, "Following redirect");
                    observe(HopEvent::Redirecting(&next));
                    redirects.push(next.clone());
                    current = next;
                }
            }
        }

        warn!(limit = self.config.max_redirects, "Redirect limit reached");
        Err(HttpError::RedirectLoop(self.config.max_redirects))
    }

    fn classify(&mut self, current: &EndpointRef, response: HttpResponse) -> Result<HopOutcome> {
        match response.status_code {
            304 => {
                debug!(target = %current, "Cached copy still valid");
                Ok(HopOutcome::Done(response))
            }
            200 => {
                if self.cache.observe(current, &response) {
                    debug!(target = %current, "Stored Last-Modified validator");
                }
                Ok(HopOutcome::Done(response))
            }
            301 | 302 => {
                let location = response
                    .header("Location")
                    .filter(|l| !l.is_empty())
                    .ok_or_else(|| {
                        HttpError::Redirect(format!(
                            "{} response from {current} has no Location header",
                            response.status_code
                        ))
                    })?;
                Ok(HopOutcome::Redirecting(self.resolve_location(current, location)?))
            }
            _ => Ok(HopOutcome::Done(response)),
        }
    }

    fn resolve_location(&self, current: &EndpointRef, location: &str) -> Result<EndpointRef> {
        if self.config.follow_relative_locations && location.starts_with('/') {
            return Ok(current.with_path(location));
        }
        EndpointRef::parse(location)
    }

    /// One request/response over a connection that is closed afterwards
    async fn exchange(
        &self,
        method: &Method,
        endpoint: &EndpointRef,
        body: &str,
    ) -> Result<HttpResponse> {
        let validator = if *method == Method::GET {
            self.cache.validator(endpoint).map(|v| v.to_string())
        } else {
            None
        };

        let mut stream = connect(endpoint, self.config.connect_timeout).await?;
        let (read_half, mut write_half) = stream.split();

        build_request(method, endpoint, body, validator.as_deref())
            .write_to(&mut write_half)
            .await?;

        let mut reader = BufReader::new(read_half);
        match self.config.read_timeout {
            Some(limit) => timeout(limit, read_response(&mut reader))
                .await
                .map_err(|_| {
                    HttpError::Connection(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("no response from {endpoint} within {limit:?}"),
                    ))
                })?,
            None => read_response(&mut reader).await,
        }
    }
}

/// Resolves `endpoint` and connects to the first address that accepts
async fn connect(endpoint: &EndpointRef, connect_timeout: Duration) -> Result<TcpStream> {
    let addrs: Vec<SocketAddr> = lookup_host((endpoint.host(), endpoint.port()))
        .await
        .map_err(|_| HttpError::UnknownHost(endpoint.host().to_string()))?
        .collect();
    if addrs.is_empty() {
        return Err(HttpError::UnknownHost(endpoint.host().to_string()));
    }

    let mut last_error = None;
    for addr in addrs {
        match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => return Ok(stream),
            Ok(Err(e)) => last_error = Some(e),
            Err(_) => {
                last_error = Some(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {addr} timed out"),
                ))
            }
        }
    }

    Err(HttpError::Connection(last_error.unwrap_or_else(|| {
        io::Error::other(format!("no address for {}", endpoint.authority()))
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfigBuilder;

    fn response(status_code: i32, headers: &[(&str, &str)]) -> HttpResponse {
        HttpResponse {
            status_code,
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_redirect_to_absolute_location() {
        let mut client = HttpClient::default();
        let current = EndpointRef::parse("http://localhost:8080/old").unwrap();
        let outcome = client
            .classify(&current, response(301, &[("Location", "http://other:9090/new.html")]))
            .unwrap();
        match outcome {
            HopOutcome::Redirecting(next) => assert_eq!(next.to_string(), "http://other:9090/new.html"),
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn test_redirect_without_location_fails() {
        let mut client = HttpClient::default();
        let current = EndpointRef::parse("http://localhost:8080/old").unwrap();
        assert!(matches!(
            client.classify(&current, response(302, &[])),
            Err(HttpError::Redirect(_))
        ));
        assert!(matches!(
            client.classify(&current, response(302, &[("Location", "")])),
            Err(HttpError::Redirect(_))
        ));
    }

    #[test]
    fn test_relative_location_needs_opt_in() {
        let current = EndpointRef::parse("http://localhost:8080/old").unwrap();

        let mut strict = HttpClient::default();
        assert!(matches!(
            strict.classify(&current, response(301, &[("Location", "/new.html")])),
            Err(HttpError::Parse(_))
        ));

        let mut lenient =
            HttpClient::new(ClientConfigBuilder::new().follow_relative_locations(true).build());
        match lenient
            .classify(&current, response(301, &[("Location", "/new.html")]))
            .unwrap()
        {
            HopOutcome::Redirecting(next) => {
                assert_eq!(next.to_string(), "http://localhost:8080/new.html")
            }
            other => panic!("expected redirect, got {other:?}"),
        }
    }

    #[test]
    fn test_ok_updates_cache_and_not_modified_does_not() {
        let mut client = HttpClient::default();
        let current = EndpointRef::parse("http://localhost:8080/index.html").unwrap();

        client
            .classify(&current, response(200, &[("Last-Modified", "1000")]))
            .unwrap();
        assert_eq!(client.cache().validator(&current), Some(1000));

        client
            .classify(&current, response(304, &[("Last-Modified", "9999")]))
            .unwrap();
        assert_eq!(client.cache().validator(&current), Some(1000));
    }

    #[test]
    fn test_other_statuses_finish_the_request() {
        let mut client = HttpClient::default();
        let current = EndpointRef::parse("http://localhost:8080/nope.html").unwrap();
        assert!(matches!(
            client.classify(&current, response(404, &[])).unwrap(),
            HopOutcome::Done(_)
        ));
        assert!(client.cache().is_empty());
    }
}
