//! Error types for reconciliation
//!
//! Every failure names the resource kind and lifecycle operation it came
//! from, so callers can render a clear message without extra context.

use converge_gateway::{GatewayResponse, TransportError};
use converge_rbac::SpecError;
use std::fmt;
use thiserror::Error;

use crate::identity::IdentityError;

/// The kind of resource being reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A custom RBAC role.
    Role,
    /// A user-to-role assignment.
    Assignment,
}

impl ResourceKind {
    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Role => "role",
            ResourceKind::Assignment => "user role assignment",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle operation in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create a new remote object.
    Create,
    /// Refresh recorded state from the remote.
    Read,
    /// Change an existing remote object in place.
    Update,
    /// Remove a remote object.
    Delete,
    /// Adopt an existing remote object.
    Import,
    /// Read-only fetch for data consumers.
    Lookup,
}

impl Operation {
    /// Verb form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Import => "import",
            Operation::Lookup => "look up",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciliation error types.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The remote call produced no answer.
    #[error("Unable to {operation} {kind}: {source}")]
    Transport {
        /// Resource kind.
        kind: ResourceKind,
        /// Operation in progress.
        operation: Operation,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// The remote answered with an unexpected status or payload.
    #[error("Unexpected API response while trying to {operation} {kind}: status {status}: {message}")]
    Protocol {
        /// Resource kind.
        kind: ResourceKind,
        /// Operation in progress.
        operation: Operation,
        /// Observed HTTP status.
        status: u16,
        /// Response body or explanation.
        message: String,
    },

    /// A looked-up object does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Resource kind.
        kind: ResourceKind,
        /// Identifier that was looked up.
        id: String,
    },

    /// An identifier failed local validation.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The declared record failed local validation.
    #[error("Invalid {kind}: {source}")]
    InvalidSpec {
        /// Resource kind.
        kind: ResourceKind,
        /// Validation failure.
        #[source]
        source: SpecError,
    },

    /// The change cannot be applied in place.
    #[error("{kind} cannot be updated in place; destroy and recreate it instead")]
    ReplacementRequired {
        /// Resource kind.
        kind: ResourceKind,
    },

    /// The remote accepted a write but does not show its effect.
    #[error("{kind} {id} was accepted but is not present remotely")]
    Unconfirmed {
        /// Resource kind.
        kind: ResourceKind,
        /// Identifier that was written.
        id: String,
    },

    /// The invocation was cancelled by the caller.
    #[error("Cancelled while trying to {operation} {kind}")]
    Cancelled {
        /// Resource kind.
        kind: ResourceKind,
        /// Operation in progress.
        operation: Operation,
    },

    /// The caller's deadline passed.
    #[error("Deadline exceeded while trying to {operation} {kind}")]
    DeadlineExceeded {
        /// Resource kind.
        kind: ResourceKind,
        /// Operation in progress.
        operation: Operation,
    },
}

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

impl ReconcileError {
    /// Build a `Protocol` error from a response the operation cannot accept.
    pub fn unexpected<T>(
        kind: ResourceKind,
        operation: Operation,
        response: GatewayResponse<T>,
    ) -> Self {
        let (status, message) = match response {
            GatewayResponse::Unexpected { status, message } => (status, message),
            GatewayResponse::NotFound => (404, "not found".to_string()),
            GatewayResponse::Ok(_) => (200, "success was not expected here".to_string()),
        };

        ReconcileError::Protocol {
            kind,
            operation,
            status,
            message,
        }
    }

    /// Observed HTTP status, when the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ReconcileError::Protocol { status, .. } => Some(*status),
            ReconcileError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    /// Check whether the failure happened before any remote call.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ReconcileError::Identity(_)
                | ReconcileError::InvalidSpec { .. }
                | ReconcileError::ReplacementRequired { .. }
        )
    }

    /// Short summary suitable as a diagnostic title.
    pub fn summary(&self) -> &'static str {
        match self {
            ReconcileError::Transport { .. } => "API Error",
            ReconcileError::Protocol { .. } => "Unexpected API Response",
            ReconcileError::NotFound { .. } => "Not Found",
            ReconcileError::Identity(_) => "Invalid Identifier",
            ReconcileError::InvalidSpec { .. } => "Invalid Configuration",
            ReconcileError::ReplacementRequired { .. } => "Replacement Required",
            ReconcileError::Unconfirmed { .. } => "Unconfirmed Write",
            ReconcileError::Cancelled { .. } => "Cancelled",
            ReconcileError::DeadlineExceeded { .. } => "Deadline Exceeded",
        }
    }
}
