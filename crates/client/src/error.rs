use crate::LocalId;
use thiserror::Error;
use transport::TransportError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The remote call failed (network, 4xx, or 5xx).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An authenticated action was attempted without a session.
    #[error("not authenticated")]
    Unauthenticated,

    /// An exclusive operation is already in flight.
    #[error("another authentication attempt is already in progress")]
    ConcurrentOperation,

    /// Input rejected before any request was issued.
    #[error("validation error: {0}")]
    Validation(String),

    /// The service answered 2xx but without the fields the contract expects.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The session was reset while the request was in flight.
    #[error("session was reset before the response arrived")]
    Superseded,

    #[error("unknown event: {0}")]
    UnknownEvent(LocalId),

    /// The event is not in a state that allows the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Contract(#[from] contract::Error),
}

impl Error {
    /// Message suitable for `Session::last_error` and per-record failures.
    ///
    /// Transport failures surface the service-provided message verbatim.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(e) if !e.message.trim().is_empty() => e.message.clone(),
            Self::Transport(e) => e.kind.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
