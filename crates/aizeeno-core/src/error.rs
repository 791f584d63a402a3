//! Error Types

use thiserror::Error;

use crate::transport::Failure;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by [`RetryingRequester`](crate::retry::RetryingRequester)
///
/// Retryable failures never escape on their own: they are retried and only
/// leave as [`ClientError::ExhaustedRetries`] once the attempt ceiling is hit.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// Non-retryable failure, surfaced on the attempt that produced it
    #[error("{0}")]
    Rejected(Failure),

    /// Every attempt failed with a retryable failure
    #[error("Gave up after {attempts} attempts: {last}")]
    ExhaustedRetries { attempts: u32, last: Failure },
}

impl ClientError {
    /// The underlying failure, whichever way it ended the request
    pub const fn failure(&self) -> &Failure {
        match self {
            Self::Rejected(failure) | Self::ExhaustedRetries { last: failure, .. } => failure,
        }
    }

    /// Reason text of the underlying failure
    pub fn reason(&self) -> &str {
        &self.failure().reason
    }
}

/// True transport failure raised by an HTTP implementation
///
/// Connection refused, DNS, timeouts. Callers treat these as retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Transport failure: {0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
