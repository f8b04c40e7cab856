//! Gateway call outcomes.
//!
//! Every gateway call resolves to `Result<GatewayResponse<T>, TransportError>`:
//! the outer `Err` means the request never produced an HTTP answer, the inner
//! enum says what the answer was.

use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;

/// Transport-level failures: no usable answer came back.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// The remote could not be reached.
    #[error("Remote unavailable: {0}")]
    Unavailable(String),

    /// The gateway configuration is unusable.
    #[error("Invalid gateway configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A request URL could not be built from the given identifiers.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::RequestFailed(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            TransportError::Unavailable(_) => true,
            TransportError::ClientBuild(_)
            | TransportError::InvalidConfig(_)
            | TransportError::InvalidUrl(_) => false,
        }
    }
}

/// Result type for gateway calls.
pub type GatewayResult<T> = Result<T, TransportError>;

/// The answer to a single gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayResponse<T> {
    /// Success, with the expected payload.
    Ok(T),

    /// The remote answered 404.
    NotFound,

    /// Any other status, or a success status without the expected payload.
    Unexpected {
        /// Observed HTTP status code.
        status: u16,
        /// Response body or decode failure.
        message: String,
    },
}

impl<T> GatewayResponse<T> {
    /// Build an `Unexpected` response.
    pub fn unexpected(status: u16, message: impl Into<String>) -> Self {
        GatewayResponse::Unexpected {
            status,
            message: message.into(),
        }
    }

    /// Transform the success payload.
    pub fn map<U, F>(self, f: F) -> GatewayResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            GatewayResponse::Ok(value) => GatewayResponse::Ok(f(value)),
            GatewayResponse::NotFound => GatewayResponse::NotFound,
            GatewayResponse::Unexpected { status, message } => {
                GatewayResponse::Unexpected { status, message }
            }
        }
    }

    /// Check for success.
    pub fn is_ok(&self) -> bool {
        matches!(self, GatewayResponse::Ok(_))
    }

    /// Check for a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayResponse::NotFound)
    }

    /// The status this outcome corresponds to, for diagnostics.
    ///
    /// Success has no single status (200, 201 and 204 all land here), so it
    /// yields `None`.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayResponse::Ok(_) => None,
            GatewayResponse::NotFound => Some(404),
            GatewayResponse::Unexpected { status, .. } => Some(*status),
        }
    }
}

impl<T> fmt::Display for GatewayResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayResponse::Ok(_) => write!(f, "ok"),
            GatewayResponse::NotFound => write!(f, "not found (404)"),
            GatewayResponse::Unexpected { status, message } => {
                write!(f, "unexpected status {}: {}", status, message)
            }
        }
    }
}
