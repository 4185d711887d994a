use super::config::ServerConfig;
use super::router::Router;
use crate::codec::{build_response, read_exact_or_eof, read_request_head, HttpRequest, HTTP_VERSION};
use crate::{HttpError, Result};
use http::StatusCode;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Per-connection I/O deadlines; `None` waits for as long as the peer does
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadlines {
    /// Bounds reading a request head and its body
    pub read: Option<Duration>,
    /// Bounds writing one whole response
    pub write: Option<Duration>,
}

impl From<&ServerConfig> for Deadlines {
    fn from(config: &ServerConfig) -> Self {
        Self {
            read: config.read_timeout,
            write: config.write_timeout,
        }
    }
}

/// Serves requests on one accepted socket until it should close
///
/// The connection stays open after a response only when the request said
/// `Connection: keep-alive`. A failed request is answered with a 500 and the
/// connection is closed; a peer that misses a deadline is dropped without a
/// response. The socket is released on every return path.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    router: &Router,
    deadlines: Deadlines,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut served = 0usize;

    loop {
        let request = match within(deadlines.read, "request", read_request_head(&mut reader)).await {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!(%addr, served, "Client closed connection");
                break;
            }
            Err(e) => {
                warn!(%addr, error = %e, "Dropping connection after unreadable request");
                break;
            }
        };

        let keep_alive = request.wants_keep_alive();
        info!(%addr, method = %request.method, path = %request.path, "Received request");

        match process(router, &request, &mut reader, &mut writer, deadlines).await {
            Ok(status) => {
                served += 1;
                info!(%addr, status = status.as_u16(), keep_alive, "Sent response");
            }
            Err(e) if is_timeout(&e) => {
                warn!(%addr, error = %e, "Dropping connection after timeout");
                break;
            }
            Err(e) => {
                error!(%addr, error = %e, "Request failed");
                let body = format!("Server Error: {e}");
                let reply = build_response(
                    HTTP_VERSION,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Some("text/plain"),
                    Some(&body),
                );
                let write = async { reply.write_to(&mut writer).await.map_err(HttpError::from) };
                within(deadlines.write, "error response", write).await?;
                break;
            }
        }

        if !keep_alive {
            break;
        }
    }

    // The peer may already be gone; closing is best effort
    let _ = writer.shutdown().await;
    Ok(())
}

/// Reads the request body, if any, and routes the request
async fn process<R, W>(
    router: &Router,
    request: &HttpRequest,
    reader: &mut R,
    writer: &mut W,
    deadlines: Deadlines,
) -> Result<StatusCode>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let body = match (request.method.as_str(), request.content_length()) {
        ("POST", Some(len)) => {
            within(deadlines.read, "request body", read_exact_or_eof(reader, len?)).await?
        }
        _ => String::new(),
    };
    within(deadlines.write, "response", router.dispatch(request, &body, writer)).await
}

async fn within<F, T>(limit: Option<Duration>, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => timeout(limit, fut).await.map_err(|_| {
            HttpError::Connection(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{what} not completed within {limit:?}"),
            ))
        })?,
        None => fut.await,
    }
}

fn is_timeout(error: &HttpError) -> bool {
    matches!(error, HttpError::Connection(e) if e.kind() == io::ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::{AccountStore, StaticFiles};
    use std::sync::Arc;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 40000))
    }

    fn router(root: &std::path::Path) -> (Router, Arc<AccountStore>) {
        let accounts = Arc::new(AccountStore::new());
        (Router::new(accounts.clone(), StaticFiles::new(root)), accounts)
    }

    #[tokio::test]
    async fn test_keep_alive_then_close() {
        let dir = tempdir().unwrap();
        let (router, accounts) = router(dir.path());
        let (mut client, server) = tokio::io::duplex(4096);

        client
            .write_all(
                b"POST /register HTTP/1.1\r\nConnection: keep-alive\r\nContent-Length: 21\r\n\r\nusername=k&password=v\
                  GET /missing.html HTTP/1.1\r\n\r\n",
            )
            .await
            .unwrap();

        handle_connection(server, peer(), &router, Deadlines::default())
            .await
            .unwrap();

        let mut raw = String::new();
        client.read_to_string(&mut raw).await.unwrap();
        assert!(raw.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(raw.contains("Register Success: k"));
        assert!(raw.contains("HTTP/1.1 404 Not Found\r\n"));
        assert!(accounts.login(Some("k"), Some("v")));
    }

    #[tokio::test]
    async fn test_stalled_request_body_hits_read_deadline() {
        let dir = tempdir().unwrap();
        let (router, accounts) = router(dir.path());
        let (mut client, server) = tokio::io::duplex(4096);

        // Declares 30 bytes and sends 10, then stays open
        client
            .write_all(b"POST /register HTTP/1.1\r\nContent-Length: 30\r\n\r\nusername=a")
            .await
            .unwrap();

        let deadlines = Deadlines {
            read: Some(Duration::from_millis(100)),
            write: None,
        };
        let served = timeout(
            Duration::from_secs(5),
            handle_connection(server, peer(), &router, deadlines),
        )
        .await;
        assert!(matches!(served, Ok(Ok(()))));
        assert!(accounts.is_empty());

        let mut raw = Vec::new();
        client.read_to_end(&mut raw).await.unwrap();
        assert!(raw.is_empty());
    }

    #[tokio::test]
    async fn test_unread_response_hits_write_deadline() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("big.txt"), "x".repeat(64 * 1024)).unwrap();
        let (router, _) = router(dir.path());
        // The pipe holds far less than the file and the client never reads
        let (mut client, server) = tokio::io::duplex(256);

        client
            .write_all(b"GET /big.txt HTTP/1.1\r\n\r\n")
            .await
            .unwrap();

        let deadlines = Deadlines {
            read: None,
            write: Some(Duration::from_millis(100)),
        };
        let served = timeout(
            Duration::from_secs(5),
            handle_connection(server, peer(), &router, deadlines),
        )
        .await;
        assert!(matches!(served, Ok(Ok(()))));
        drop(client);
    }

    #[test]
    fn test_deadlines_from_config() {
        let config = ServerConfig::default()
            .with_read_timeout(Duration::from_secs(3))
            .with_write_timeout(Duration::from_secs(4));
        let deadlines = Deadlines::from(&config);
        assert_eq!(deadlines.read, Some(Duration::from_secs(3)));
        assert_eq!(deadlines.write, Some(Duration::from_secs(4)));
    }
}
