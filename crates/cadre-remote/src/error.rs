//! Remote operation error types
//!
//! Error definitions with transient/not-found classification driving retry
//! and removal-idempotence decisions.

use thiserror::Error;

/// Error reported by a remote collaborator operation.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The addressed resource does not exist on the remote system.
    ///
    /// On removal paths this is normalized to success by the engine: an
    /// entity already deleted out-of-band is a converged entity.
    #[error("resource not found: {identifier}")]
    NotFound { identifier: String },

    /// The remote API answered with a non-success status.
    #[error("remote API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// The remote system asked us to back off.
    #[error("rate limited by remote system")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Transport-level failure before any API answer arrived.
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The operation did not complete within the transport's deadline.
    #[error("operation timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The retry budget was exhausted without a success.
    #[error("maximum retries exhausted after {attempts} attempt(s): {message}")]
    RetriesExhausted { attempts: u32, message: String },
}

impl RemoteError {
    /// Whether this error means the addressed resource is already absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }

    /// Whether this error is a transient transport-level condition worth
    /// retrying without inspecting the response body.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::Network { .. } | RemoteError::Timeout { .. } | RemoteError::RateLimited { .. }
        )
    }

    /// Whether the remote answered with a server-side (5xx) status.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, RemoteError::Api { status, .. } if *status >= 500)
    }

    /// The response body, for errors that carry one.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            RemoteError::Api { body, .. } => Some(body),
            _ => None,
        }
    }

    // Convenience constructors

    /// Create a not-found error.
    pub fn not_found(identifier: impl Into<String>) -> Self {
        RemoteError::NotFound {
            identifier: identifier.into(),
        }
    }

    /// Create an API error from a status and response body.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        RemoteError::Api {
            status,
            body: body.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        RemoteError::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with its underlying cause.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RemoteError::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type for remote collaborator operations.
pub type RemoteResult<T> = Result<T, RemoteError>;
