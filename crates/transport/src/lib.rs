//! HTTP transport for the expense-splitter client.
//!
//! Every call to the remote service goes through a [`Transport`]. A transport
//! takes a [`Request`] and resolves to either the decoded JSON body of a 2xx
//! response or a [`TransportError`] describing what went wrong. Transports
//! never retry and never touch client state; callers decide what an outcome
//! means.
//!
//! # Overview
//!
//! - [`Request`]: one in-flight call (method, service-relative path, JSON
//!   body, and the bearer credential when the route needs one).
//! - [`Transport`]: the seam the session and event controllers are written
//!   against, so tests can substitute a scripted double.
//! - [`HttpTransport`]: the reqwest-backed implementation.
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use transport::{HttpTransport, Request, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = HttpTransport::builder("http://localhost:5000").build()?;
//! let body = http
//!     .send(Request::post("/auth/login").json(json!({"email": "a@b.com", "password": "x"})))
//!     .await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

mod error;
mod http;
mod request;

pub use error::{BuildError, ErrorKind, Result, TransportError};
pub use http::{HttpTransport, HttpTransportBuilder};
pub use request::{Credential, Method, Request};

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Trait for transports.
///
/// Implementations must normalize every failure into [`TransportError`];
/// nothing may panic or escape past `send`.
pub trait Transport: Send + Sync {
    /// Perform the request and return the decoded response body.
    ///
    /// Empty or non-JSON success bodies decode to [`Value::Null`].
    fn send(&self, request: Request) -> impl Future<Output = Result<Value>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn send(&self, request: Request) -> impl Future<Output = Result<Value>> + Send {
        (**self).send(request)
    }
}
