//! Errors shared by every gateway operation.

use thiserror::Error;

/// Result alias for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Represents an error that can occur when talking to the gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Caller input was malformed or missing. Raised before any network attempt.
    #[error("Validation Error: {0}")]
    Validation(String),

    /// The gateway answered with a non-2xx status, or no usable connection was established.
    #[error(
        "{operation} request failed{}{}",
        status.map(|s| format!(" with status {s}")).unwrap_or_default(),
        body.as_ref().map(|b| format!(": {b}")).unwrap_or_default()
    )]
    Transport {
        /// The operation that failed (e.g. "Inference", "Create datapoint").
        operation: String,
        /// HTTP status code, absent when the connection itself failed.
        status: Option<u16>,
        /// Response body text or underlying network error, when available.
        body: Option<String>,
    },

    /// A 2xx body did not match the expected contract.
    #[error("Parse Error: {0}")]
    Parse(String),
}

impl GatewayError {
    /// Builds a transport error for a non-2xx response.
    pub fn status(operation: &str, status: u16, body: Option<String>) -> Self {
        Self::Transport { operation: operation.to_string(), status: Some(status), body }
    }

    /// Builds a transport error for a connection that failed without a status.
    pub fn network(operation: &str, error: impl std::fmt::Display) -> Self {
        Self::Transport {
            operation: operation.to_string(),
            status: None,
            body: Some(error.to_string()),
        }
    }

    /// Status code carried by a transport error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
