//! Declarative wire contract for the expense-splitter service.
//!
//! The service's request payloads have changed shape between revisions. A
//! [`Contract`] maps the client's local fields onto wire names per endpoint,
//! so following a new revision is a configuration change rather than a code
//! change.

mod contract;
mod error;

pub use contract::{Contract, Endpoint, Field};
pub use error::{Error, Result};
