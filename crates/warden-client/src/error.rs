//! Error types for the permission-check client.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Error returned when a permission check cannot be answered.
///
/// A denied permission is not an error; see [`Decision`].
///
/// [`Decision`]: crate::Decision
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
    /// The request to the Warden server failed or timed out.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// The Warden server answered with an unexpected status.
    #[error("Unexpected response status: {0}")]
    UnexpectedStatus(reqwest::StatusCode),
}

impl ClientError {
    /// Returns whether the check timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Reqwest(err) if err.is_timeout())
    }
}
