//! The lifecycle contract shared by every resource kind.

use async_trait::async_trait;

use crate::context::InvocationContext;
use crate::drift::Drift;
use crate::error::{ReconcileResult, ResourceKind};

/// Result of refreshing a recorded resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome<S> {
    /// The resource still exists remotely.
    Present {
        /// Refreshed state, taken entirely from the remote.
        state: S,
        /// Attributes that changed since the recorded state.
        drift: Vec<Drift>,
    },

    /// The resource no longer exists remotely; the caller should purge it.
    Removed,
}

impl<S> ReadOutcome<S> {
    /// Present with no drift.
    pub fn unchanged(state: S) -> Self {
        ReadOutcome::Present {
            state,
            drift: Vec::new(),
        }
    }

    /// Whether the remote entity is gone.
    pub fn is_removed(&self) -> bool {
        matches!(self, ReadOutcome::Removed)
    }

    /// Whether any attribute drifted.
    pub fn has_drift(&self) -> bool {
        matches!(self, ReadOutcome::Present { drift, .. } if !drift.is_empty())
    }

    /// Borrow the refreshed state.
    pub fn state(&self) -> Option<&S> {
        match self {
            ReadOutcome::Present { state, .. } => Some(state),
            ReadOutcome::Removed => None,
        }
    }

    /// Take the refreshed state.
    pub fn into_state(self) -> Option<S> {
        match self {
            ReadOutcome::Present { state, .. } => Some(state),
            ReadOutcome::Removed => None,
        }
    }
}

/// Drives create/read/update/delete/import for one resource kind.
///
/// Implementations hold no mutable state. Each call is one invocation for
/// one resource instance, issues a small fixed number of gateway calls in
/// sequence, and returns the remote-confirmed state or a structured error.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Declared form of the resource.
    type Spec: Send + Sync;

    /// Persisted form of the resource.
    type State: Send + Sync;

    /// Resource kind, for errors and logs.
    fn kind(&self) -> ResourceKind;

    /// Bring a new remote object into existence.
    async fn create(&self, ctx: &InvocationContext, spec: &Self::Spec)
        -> ReconcileResult<Self::State>;

    /// Refresh recorded state from the remote.
    async fn read(
        &self,
        ctx: &InvocationContext,
        state: &Self::State,
    ) -> ReconcileResult<ReadOutcome<Self::State>>;

    /// Apply the declared attributes to an existing remote object.
    async fn update(
        &self,
        ctx: &InvocationContext,
        state: &Self::State,
        spec: &Self::Spec,
    ) -> ReconcileResult<Self::State>;

    /// Remove the remote object. Already-gone counts as success.
    async fn delete(&self, ctx: &InvocationContext, state: &Self::State) -> ReconcileResult<()>;

    /// Adopt an existing remote object by its import identifier.
    async fn import(
        &self,
        ctx: &InvocationContext,
        id: &str,
    ) -> ReconcileResult<ReadOutcome<Self::State>>;

    /// Plan-time check: must moving to `spec` destroy and recreate?
    fn requires_replacement(&self, _state: &Self::State, _spec: &Self::Spec) -> bool {
        false
    }
}
