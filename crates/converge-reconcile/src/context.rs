//! Per-invocation context
//!
//! The surrounding tool owns cancellation and deadlines. Reconcilers define
//! no timeouts of their own; they race every gateway call against the
//! caller's [`CancellationToken`] and optional deadline.

use std::future::Future;
use std::time::Duration;

use converge_gateway::GatewayResult;
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Operation, ReconcileError, ReconcileResult, ResourceKind};

/// Cancellation and deadline for a single lifecycle invocation.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl InvocationContext {
    /// Context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a caller-owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Abort remote calls still running at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abort remote calls still running `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The token this context observes.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel the invocation.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive one gateway call under this context.
    ///
    /// The call future is dropped on cancellation or when the deadline
    /// passes, which aborts any request still in flight.
    pub(crate) async fn run<T, F>(
        &self,
        kind: ResourceKind,
        operation: Operation,
        call: F,
    ) -> ReconcileResult<T>
    where
        F: Future<Output = GatewayResult<T>>,
    {
        if self.is_cancelled() {
            debug!(%kind, %operation, "Invocation cancelled before remote call");
            return Err(ReconcileError::Cancelled { kind, operation });
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => timeout_at(deadline, call)
                    .await
                    .map_err(|_| ReconcileError::DeadlineExceeded { kind, operation }),
                None => Ok(call.await),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(%kind, %operation, "Invocation cancelled during remote call");
                Err(ReconcileError::Cancelled { kind, operation })
            }
            outcome = bounded => match outcome {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(source)) => Err(ReconcileError::Transport {
                    kind,
                    operation,
                    source,
                }),
                Err(aborted) => Err(aborted),
            },
        }
    }
}
