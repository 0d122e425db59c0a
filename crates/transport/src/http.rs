//! reqwest-backed transport.

use crate::{BuildError, ErrorKind, Request, Result, Transport, TransportError};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const DEFAULT_USER_AGENT: &str = concat!("splitter/", env!("CARGO_PKG_VERSION"));

/// Builder for creating an HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    base_url: String,
    timeout: Option<Duration>,
    user_agent: String,
}

impl HttpTransportBuilder {
    /// Create a new builder for the given service base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Abort calls that take longer than `timeout`. Unset by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Override the user agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the transport.
    pub fn build(self) -> std::result::Result<HttpTransport, BuildError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        let host = base_url
            .strip_prefix("https://")
            .or_else(|| base_url.strip_prefix("http://"));
        if host.is_none_or(str::is_empty) {
            return Err(BuildError::InvalidBaseUrl(self.base_url));
        }

        let mut client = reqwest::Client::builder().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }

        Ok(HttpTransport {
            client: client.build()?,
            base_url,
        })
    }
}

/// Transport that talks to the service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a builder for the HTTP transport.
    pub fn builder(base_url: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

impl std::fmt::Display for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "http({})", self.base_url)
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Value> {
        let url = self.url(&request.path);
        debug!(
            method = %request.method,
            path = %request.path,
            auth = request.requires_auth(),
            "dispatching request"
        );

        let mut req = self
            .client
            .request(request.method.into(), &url)
            .header("accept", "application/json");
        if let Some(credential) = &request.bearer {
            req = req.bearer_auth(credential.expose());
        }
        if let Some(body) = &request.body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| {
            warn!(path = %request.path, error = %e, "request failed before a response");
            TransportError::network(e.to_string())
        })?;

        // A status was received, so a broken body never makes this a network
        // failure; it decodes as empty.
        let status = response.status();
        let bytes = response.bytes().await.unwrap_or_else(|e| {
            warn!(path = %request.path, status = status.as_u16(), error = %e, "unreadable response body");
            Default::default()
        });

        if status.is_success() {
            debug!(path = %request.path, status = status.as_u16(), "request succeeded");
            return Ok(decode_success(&bytes));
        }

        let message = extract_message(&bytes).unwrap_or_else(|| match status.canonical_reason() {
            Some(reason) => format!("request failed with status {} {reason}", status.as_u16()),
            None => format!("request failed with status {}", status.as_u16()),
        });
        warn!(path = %request.path, status = status.as_u16(), %message, "request rejected");
        Err(TransportError::new(
            ErrorKind::from_status(status.as_u16()),
            message,
        ))
    }
}

/// Decode a 2xx body; anything that is not JSON becomes `Null`.
fn decode_success(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!(error = %e, "success body is not JSON, ignoring");
        Value::Null
    })
}

/// Pull a human-readable message out of an error body.
///
/// The service reports failures as `{"message": ..}` and, on some routes,
/// `{"error": ..}`.
fn extract_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key)?.as_str())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
}
