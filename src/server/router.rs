use super::accounts::AccountStore;
use super::static_files::StaticFiles;
use crate::codec::{build_redirect, build_response, HttpMessage, HttpRequest, HTTP_VERSION};
use crate::Result;
use http::StatusCode;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tracing::info;

/// Where a request goes, decided from its method and path alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Redirect {
        status: StatusCode,
        location: &'static str,
    },
    Register,
    Login,
    Static,
}

impl Route {
    /// Picks the route in fixed priority order, falling back to static files
    pub fn resolve(method: &str, path: &str) -> Self {
        match (method, path) {
            ("GET", "/old") => Route::Redirect {
                status: StatusCode::MOVED_PERMANENTLY,
                location: "/new.html",
            },
            ("GET", "/temp") => Route::Redirect {
                status: StatusCode::FOUND,
                location: "/temp-new.html",
            },
            ("POST", "/register") => Route::Register,
            ("POST", "/login") => Route::Login,
            _ => Route::Static,
        }
    }
}

/// Splits an `application/x-www-form-urlencoded` body into fields
///
/// Pairs without `=` are dropped and a repeated key keeps its last value.
/// Values are taken as-is, without percent-decoding.
pub fn parse_form(body: &str) -> HashMap<&str, &str> {
    body.split('&')
        .filter_map(|pair| pair.split_once('='))
        .collect()
}

/// Dispatches requests to redirects, the account endpoints or static files
#[derive(Debug, Clone)]
pub struct Router {
    accounts: Arc<AccountStore>,
    static_files: StaticFiles,
}

impl Router {
    pub fn new(accounts: Arc<AccountStore>, static_files: StaticFiles) -> Self {
        Self {
            accounts,
            static_files,
        }
    }

    pub fn accounts(&self) -> &Arc<AccountStore> {
        &self.accounts
    }

    /// Writes the response for `request` and returns its status
    pub async fn dispatch<W>(
        &self,
        request: &HttpRequest,
        body: &str,
        writer: &mut W,
    ) -> Result<StatusCode>
    where
        W: AsyncWrite + Unpin,
    {
        let route = Route::resolve(&request.method, &request.path);
        let (status, response) = match route {
            Route::Redirect { status, location } => {
                (status, build_redirect(&request.protocol, status, location))
            }
            Route::Register => self.register(body),
            Route::Login => self.login(body),
            Route::Static => return self.static_files.respond(request, writer).await,
        };
        response.write_to(writer).await?;
        Ok(status)
    }

    fn register(&self, body: &str) -> (StatusCode, HttpMessage) {
        let form = parse_form(body);
        let username = form.get("username").copied().unwrap_or_default();
        let password = form.get("password").copied().unwrap_or_default();

        if username.is_empty() || password.is_empty() {
            return text(StatusCode::BAD_REQUEST, "Username and Password are required");
        }
        if self.accounts.register(username, password) {
            info!(username, "Registered account");
            text(StatusCode::OK, &format!("Register Success: {username}"))
        } else {
            text(StatusCode::CONFLICT, &format!("Username already exists: {username}"))
        }
    }

    fn login(&self, body: &str) -> (StatusCode, HttpMessage) {
        let form = parse_form(body);
        let username = form.get("username").copied();

        if self.accounts.login(username, form.get("password").copied()) {
            let username = username.unwrap_or_default();
            info!(username, "Login succeeded");
            text(StatusCode::OK, &format!("Login Success: Welcome {username}"))
        } else {
            text(StatusCode::UNAUTHORIZED, "Login Failed: Invalid username or password")
        }
    }
}

fn text(status: StatusCode, body: &str) -> (StatusCode, HttpMessage) {
    (
        status,
        build_response(HTTP_VERSION, status, Some("text/plain"), Some(body)),
    )
}
