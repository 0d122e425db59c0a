use thiserror::Error;

/// Classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was obtained (connection refused, DNS, timeout, reset).
    Network,
    /// The service answered with a 4xx status.
    Client(u16),
    /// The service answered with a 5xx status, or any other non-2xx status.
    Server(u16),
}

impl ErrorKind {
    /// Classify a non-success HTTP status code.
    pub fn from_status(status: u16) -> Self {
        if (400..500).contains(&status) {
            Self::Client(status)
        } else {
            Self::Server(status)
        }
    }

    /// The HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network => None,
            Self::Client(s) | Self::Server(s) => Some(*s),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network failure"),
            Self::Client(s) => write!(f, "client error ({s})"),
            Self::Server(s) => write!(f, "server error ({s})"),
        }
    }
}

/// A normalized transport failure.
///
/// `message` is the service-provided explanation when the error body carried
/// one, otherwise a generic description of the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: ErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn is_network(&self) -> bool {
        self.kind == ErrorKind::Network
    }

    pub fn is_client(&self) -> bool {
        matches!(self.kind, ErrorKind::Client(_))
    }

    pub fn is_server(&self) -> bool {
        matches!(self.kind, ErrorKind::Server(_))
    }
}

/// Errors raised while constructing an [`HttpTransport`](crate::HttpTransport).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuildError {
    /// The base URL is not an absolute http(s) URL.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    /// The underlying HTTP client could not be created.
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Client(401));
        assert_eq!(ErrorKind::from_status(499), ErrorKind::Client(499));
        assert_eq!(ErrorKind::from_status(500), ErrorKind::Server(500));
        assert_eq!(ErrorKind::from_status(302), ErrorKind::Server(302));
    }

    #[test]
    fn display_includes_kind_and_message() {
        let err = TransportError::new(ErrorKind::Client(409), "email already registered");
        assert_eq!(err.to_string(), "client error (409): email already registered");
        assert!(err.is_client());
        assert_eq!(err.kind.status(), Some(409));
        assert_eq!(TransportError::network("refused").kind.status(), None);
    }
}
