//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No event id starts with the given prefix.
    #[error("no event found matching '{prefix}'")]
    EventNotFound { prefix: String },

    /// Multiple events match the given prefix.
    ///
    /// The user should provide a longer prefix to disambiguate.
    #[error("multiple events match '{prefix}': {matches:?}")]
    AmbiguousEvent {
        prefix: String,
        matches: Vec<String>,
    },

    /// Configuration is invalid or unreadable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP transport could not be built.
    #[error(transparent)]
    Transport(#[from] transport::BuildError),

    /// An error occurred in the client layer.
    #[error(transparent)]
    Client(#[from] client::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
