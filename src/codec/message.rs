use crate::network::EndpointRef;
use bytes::{BufMut, Bytes, BytesMut};
use http::{Method, StatusCode};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Protocol token written on request lines and echoed by the server
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Line terminator used when encoding a message
///
/// Responses are written with CRLF, client requests with a bare LF. The
/// reader accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Crlf,
    Lf,
}

impl LineEnding {
    fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Crlf => b"\r\n",
            LineEnding::Lf => b"\n",
        }
    }
}

/// An outbound HTTP message: start line, ordered headers and an optional body
///
/// Header names are kept exactly as given and written in insertion order.
#[derive(Debug, Clone)]
pub struct HttpMessage {
    start_line: String,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    line_ending: LineEnding,
}

impl HttpMessage {
    pub fn new(start_line: impl Into<String>, line_ending: LineEnding) -> Self {
        Self {
            start_line: start_line.into(),
            headers: Vec::new(),
            body: None,
            line_ending,
        }
    }

    /// Appends a header line
    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.headers.push((name.into(), value.to_string()));
        self
    }

    /// Sets the body written right after the blank line
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn start_line(&self) -> &str {
        &self.start_line
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of the named header, compared case-sensitively
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Serializes the head, the blank line and the body into one buffer
    pub fn encode(&self) -> BytesMut {
        let eol = self.line_ending.as_bytes();
        let body_len = self.body.as_ref().map_or(0, Bytes::len);
        let mut buf = BytesMut::with_capacity(256 + body_len);

        buf.put_slice(self.start_line.as_bytes());
        buf.put_slice(eol);
        for (name, value) in &self.headers {
            buf.put_slice(name.as_bytes());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(eol);
        }
        buf.put_slice(eol);
        if let Some(body) = &self.body {
            buf.put_slice(body);
        }
        buf
    }

    /// Writes the encoded message and flushes the stream
    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(&self.encode()).await?;
        writer.flush().await
    }
}

/// Builds a client request for `endpoint`
///
/// Headers, in order: `Host`, `Connection: close`, then for POST the form
/// `Content-Type` and `Content-Length`, and for GET an `If-Modified-Since`
/// when the caller has a cached validator.
pub fn build_request(
    method: &Method,
    endpoint: &EndpointRef,
    body: &str,
    if_modified_since: Option<&str>,
) -> HttpMessage {
    let mut message = HttpMessage::new(
        format!("{} {} {}", method, endpoint.path(), HTTP_VERSION),
        LineEnding::Lf,
    )
    .header("Host", endpoint.authority())
    .header("Connection", "close");

    if *method == Method::POST {
        message = message
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Content-Length", body.len());
        if !body.is_empty() {
            message = message.body(body.to_string());
        }
    } else if *method == Method::GET {
        if let Some(validator) = if_modified_since {
            message = message.header("If-Modified-Since", validator);
        }
    }

    message
}

fn status_line(protocol: &str, status: StatusCode) -> String {
    format!(
        "{} {} {}",
        protocol,
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
}

/// Builds a server response head (and text body, if any)
///
/// `Content-Type` is present iff `mime` is given and `Content-Length` iff a
/// text `body` is given. A 200 whose MIME type is not `text/plain` also gets
/// a `Last-Modified` stamped with the current time in epoch milliseconds.
pub fn build_response(
    protocol: &str,
    status: StatusCode,
    mime: Option<&str>,
    body: Option<&str>,
) -> HttpMessage {
    let mut message = HttpMessage::new(status_line(protocol, status), LineEnding::Crlf)
        .header("Connection", "keep-alive");

    if let Some(mime) = mime {
        message = message.header("Content-Type", mime);
    }
    if let Some(body) = body {
        message = message.header("Content-Length", body.len());
    }
    if status == StatusCode::OK && mime.is_some_and(|m| !m.starts_with("text/plain")) {
        message = message.header("Last-Modified", now_millis());
    }
    if let Some(body) = body {
        message = message.body(body.to_string());
    }

    message
}

/// Builds a bodiless 301/302 response pointing at `location`
pub fn build_redirect(protocol: &str, status: StatusCode, location: &str) -> HttpMessage {
    HttpMessage::new(status_line(protocol, status), LineEnding::Crlf)
        .header("Location", location)
        .header("Connection", "keep-alive")
}

/// Milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    system_time_millis(SystemTime::now())
}

/// Converts a timestamp to epoch milliseconds, clamping pre-epoch times to zero
pub fn system_time_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
