use super::mime;
use crate::codec::{build_response, system_time_millis, HttpRequest};
use crate::{HttpError, Result};
use http::StatusCode;
use std::path::{Component, Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Document served for `/`
pub const INDEX_DOCUMENT: &str = "/index.html";

/// Serves files below a fixed root directory
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a request path to a file under the root
    ///
    /// Returns `None` for paths that would step outside the root.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }

    /// Answers a request for a static resource and returns the status sent
    ///
    /// The file body is streamed after the head without a `Content-Length`.
    pub async fn respond<W>(&self, request: &HttpRequest, writer: &mut W) -> Result<StatusCode>
    where
        W: AsyncWrite + Unpin,
    {
        let protocol = request.protocol.as_str();

        if request.method != "GET" {
            let body = format!("Method {} Not Allowed", request.method);
            build_response(protocol, StatusCode::METHOD_NOT_ALLOWED, Some("text/plain"), Some(&body))
                .write_to(writer)
                .await?;
            return Ok(StatusCode::METHOD_NOT_ALLOWED);
        }

        let path = if request.path == "/" {
            INDEX_DOCUMENT
        } else {
            request.path.as_str()
        };

        let metadata = match self.resolve(path) {
            Some(file_path) => tokio::fs::metadata(&file_path)
                .await
                .ok()
                .filter(|m| m.is_file())
                .map(|m| (file_path, m)),
            None => None,
        };
        let Some((file_path, metadata)) = metadata else {
            debug!(path, "Static resource not found");
            let body = format!("Resource Not Found: {path}");
            build_response(protocol, StatusCode::NOT_FOUND, Some("text/plain"), Some(&body))
                .write_to(writer)
                .await?;
            return Ok(StatusCode::NOT_FOUND);
        };

        if let Some(since) = request.header("If-Modified-Since") {
            let since = since.trim().parse::<i64>().map_err(|e| {
                HttpError::ServerInternal(format!("Invalid If-Modified-Since '{since}': {e}"))
            })?;
            let modified = system_time_millis(metadata.modified()?);
            if modified <= since {
                debug!(path, modified, since, "Static resource not modified");
                build_response(protocol, StatusCode::NOT_MODIFIED, None, None)
                    .write_to(writer)
                    .await?;
                return Ok(StatusCode::NOT_MODIFIED);
            }
        }

        let mut file = File::open(&file_path).await?;
        build_response(protocol, StatusCode::OK, Some(mime::lookup(path)), None)
            .write_to(writer)
            .await?;
        let sent = tokio::io::copy(&mut file, writer).await?;
        writer.flush().await?;
        debug!(path, bytes = sent, "Streamed static resource");

        Ok(StatusCode::OK)
    }
}
