use crate::HttpError;
use std::collections::HashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Header map of a parsed message; a repeated name keeps its last value
pub type Headers = HashMap<String, String>;

/// A response read off the wire
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status_code: i32,
    pub status_message: String,
    pub headers: Headers,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.status_code, 301 | 302)
    }
}

/// The head of a request read off the wire
///
/// The body is not read here: only the server decides whether one follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub headers: Headers,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// True only when the peer explicitly asked for `Connection: keep-alive`
    pub fn wants_keep_alive(&self) -> bool {
        self.header("Connection")
            .unwrap_or("close")
            .eq_ignore_ascii_case("keep-alive")
    }

    /// Declared `Content-Length`, if present and numeric
    pub fn content_length(&self) -> Option<Result<usize, HttpError>> {
        self.header("Content-Length").map(|value| {
            value
                .trim()
                .parse::<usize>()
                .map_err(|e| HttpError::Protocol(format!("Invalid Content-Length '{value}': {e}")))
        })
    }
}

/// Reads one line, accepting either `\r\n` or `\n` as terminator
///
/// Returns `None` once the stream is exhausted.
pub async fn read_line<R>(reader: &mut R) -> Result<Option<String>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut raw = Vec::new();
    let n = reader.read_until(b'\n', &mut raw).await?;
    if n == 0 {
        return Ok(None);
    }
    if raw.last() == Some(&b'\n') {
        raw.pop();
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&raw).into_owned()))
}

/// Reads header lines up to the blank line or end of stream
///
/// Each line is split on the first `": "`; lines without one are skipped.
pub async fn read_headers<R>(reader: &mut R) -> Result<Headers, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = Headers::new();
    while let Some(line) = read_line(reader).await? {
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(": ") {
            headers.insert(name.to_string(), value.to_string());
        }
    }
    Ok(headers)
}

/// Reads up to `len` bytes, returning fewer if the stream ends first
pub async fn read_exact_or_eof<R>(reader: &mut R, len: usize) -> Result<String, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(len.min(64 * 1024));
    (&mut *reader).take(len as u64).read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Reads the remaining lines until the peer closes, each followed by `\n`
pub async fn read_to_close<R>(reader: &mut R) -> Result<String, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = String::new();
    while let Some(line) = read_line(reader).await? {
        body.push_str(&line);
        body.push('\n');
    }
    Ok(body)
}

/// Parses a full response: status line, headers and body
///
/// With a numeric `Content-Length` the body is read up to that many bytes (a
/// truncated stream is not an error); otherwise it is read until the peer
/// closes the connection.
pub async fn read_response<R>(reader: &mut R) -> Result<HttpResponse, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let status_line = read_line(reader)
        .await?
        .ok_or_else(|| HttpError::Protocol("Connection closed before a status line".to_string()))?;

    let mut parts = status_line.splitn(3, ' ');
    let _protocol = parts.next();
    let code = parts
        .next()
        .ok_or_else(|| HttpError::Protocol(format!("Missing status code: {status_line}")))?;
    let status_code = code
        .parse::<i32>()
        .map_err(|_| HttpError::Protocol(format!("Invalid status code: {code}")))?;
    let status_message = parts.next().unwrap_or_default().to_string();

    let headers = read_headers(reader).await?;

    let declared = headers
        .get("Content-Length")
        .and_then(|v| v.trim().parse::<usize>().ok());
    let body = match declared {
        Some(len) => read_exact_or_eof(reader, len).await?,
        None => read_to_close(reader).await?,
    };

    Ok(HttpResponse {
        status_code,
        status_message,
        headers,
        body,
    })
}

/// Parses a request line and its headers
///
/// Returns `Ok(None)` when the stream ends before any line arrives, which is
/// how a keep-alive peer hangs up between requests.
pub async fn read_request_head<R>(reader: &mut R) -> Result<Option<HttpRequest>, HttpError>
where
    R: AsyncBufRead + Unpin,
{
    let Some(request_line) = read_line(reader).await? else {
        return Ok(None);
    };

    let mut parts = request_line.splitn(3, ' ');
    let (Some(method), Some(path), Some(protocol)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(HttpError::Protocol(format!("Malformed request line: {request_line}")));
    };
    if method.is_empty() || path.is_empty() {
        return Err(HttpError::Protocol(format!("Malformed request line: {request_line}")));
    }

    let headers = read_headers(reader).await?;

    Ok(Some(HttpRequest {
        method: method.to_string(),
        path: path.to_string(),
        protocol: protocol.to_string(),
        headers,
    }))
}
