//! Contract error types.

use thiserror::Error;

/// Contract errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The contract is structurally invalid.
    #[error("invalid contract: {0}")]
    Invalid(String),

    /// Failed to parse a contract file.
    #[error("failed to parse contract: {0}")]
    Parse(String),

    /// An I/O error occurred while reading a contract.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
