//! User role assignment reconciliation
//!
//! Assignments have no remote identifier. Their identity is the composite of
//! user and role, built locally by [`crate::identity`]. The remote offers no
//! direct fetch, so presence is checked by listing the user's roles and
//! searching for the role.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use converge_gateway::{GatewayResponse, RemoteGateway};
use converge_rbac::{AssignmentSpec, AssignmentState};
use tracing::{debug, info, instrument, warn};

use crate::context::InvocationContext;
use crate::error::{Operation, ReconcileError, ReconcileResult, ResourceKind};
use crate::identity::{self, CompositeId};
use crate::reconciler::{ReadOutcome, Reconciler};

const KIND: ResourceKind = ResourceKind::Assignment;

/// Reconciler for user role assignments.
#[derive(Clone)]
pub struct AssignmentReconciler {
    gateway: Arc<dyn RemoteGateway>,

    /// Read back after create and fail if the assignment is not listed.
    verify_after_create: bool,
}

impl fmt::Debug for AssignmentReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssignmentReconciler")
            .field("verify_after_create", &self.verify_after_create)
            .finish_non_exhaustive()
    }
}

impl AssignmentReconciler {
    /// Create a reconciler over `gateway`. Creates are not verified.
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            gateway,
            verify_after_create: false,
        }
    }

    /// Toggle the read-back check after create.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_after_create = verify;
        self
    }

    /// Check whether `role_id` is among the roles listed for `user_id`.
    ///
    /// A user the remote does not know has no assignments.
    async fn is_assigned(
        &self,
        ctx: &InvocationContext,
        operation: Operation,
        user_id: &str,
        role_id: &str,
    ) -> ReconcileResult<bool> {
        debug!(%user_id, %role_id, "Listing roles for user");

        match ctx
            .run(KIND, operation, self.gateway.list_roles_for_user(user_id))
            .await?
        {
            GatewayResponse::Ok(roles) => Ok(roles.iter().any(|role| role.has_id(role_id))),
            GatewayResponse::NotFound => Ok(false),
            other => Err(ReconcileError::unexpected(KIND, operation, other)),
        }
    }
}

#[async_trait]
impl Reconciler for AssignmentReconciler {
    type Spec = AssignmentSpec;
    type State = AssignmentState;

    fn kind(&self) -> ResourceKind {
        KIND
    }

    #[instrument(skip_all, fields(user_id = %spec.user_id, role_id = %spec.role_id))]
    async fn create(
        &self,
        ctx: &InvocationContext,
        spec: &AssignmentSpec,
    ) -> ReconcileResult<AssignmentState> {
        let id = identity::encode(&spec.user_id, &spec.role_id)?;

        // Any 2xx commits; the response body is not inspected.
        match ctx
            .run(
                KIND,
                Operation::Create,
                self.gateway.create_assignment(&spec.user_id, &spec.role_id),
            )
            .await?
        {
            GatewayResponse::Ok(()) => {}
            other => return Err(ReconcileError::unexpected(KIND, Operation::Create, other)),
        }

        if self.verify_after_create
            && !self
                .is_assigned(ctx, Operation::Create, &spec.user_id, &spec.role_id)
                .await?
        {
            warn!(%id, "Assignment accepted but not listed for user");
            return Err(ReconcileError::Unconfirmed { kind: KIND, id });
        }

        info!(%id, "Assigned role to user");
        Ok(AssignmentState {
            id,
            user_id: spec.user_id.clone(),
            role_id: spec.role_id.clone(),
        })
    }

    #[instrument(skip_all, fields(id = %state.id))]
    async fn read(
        &self,
        ctx: &InvocationContext,
        state: &AssignmentState,
    ) -> ReconcileResult<ReadOutcome<AssignmentState>> {
        let (user_id, role_id) = identity::decode(&state.id)?;

        if self
            .is_assigned(ctx, Operation::Read, &user_id, &role_id)
            .await?
        {
            Ok(ReadOutcome::unchanged(state.clone()))
        } else {
            info!(id = %state.id, "Assignment no longer exists remotely; removing from state");
            Ok(ReadOutcome::Removed)
        }
    }

    #[instrument(skip_all, fields(id = %state.id))]
    async fn update(
        &self,
        _ctx: &InvocationContext,
        state: &AssignmentState,
        spec: &AssignmentSpec,
    ) -> ReconcileResult<AssignmentState> {
        if self.requires_replacement(state, spec) {
            return Err(ReconcileError::ReplacementRequired { kind: KIND });
        }
        Ok(state.clone())
    }

    #[instrument(skip_all, fields(id = %state.id))]
    async fn delete(
        &self,
        ctx: &InvocationContext,
        state: &AssignmentState,
    ) -> ReconcileResult<()> {
        let (user_id, role_id) = identity::decode(&state.id)?;

        match ctx
            .run(
                KIND,
                Operation::Delete,
                self.gateway.delete_assignment(&user_id, &role_id),
            )
            .await?
        {
            GatewayResponse::Ok(()) => {
                info!(id = %state.id, "Removed role from user");
                Ok(())
            }
            GatewayResponse::NotFound => {
                info!(id = %state.id, "Assignment already absent");
                Ok(())
            }
            other => Err(ReconcileError::unexpected(KIND, Operation::Delete, other)),
        }
    }

    async fn import(
        &self,
        _ctx: &InvocationContext,
        id: &str,
    ) -> ReconcileResult<ReadOutcome<AssignmentState>> {
        let composite: CompositeId = id.parse()?;
        let (user_id, role_id) = composite.into_parts();

        debug!(%id, "Imported assignment");
        Ok(ReadOutcome::unchanged(AssignmentState {
            id: id.to_string(),
            user_id,
            role_id,
        }))
    }

    fn requires_replacement(&self, state: &AssignmentState, spec: &AssignmentSpec) -> bool {
        state.differs_from(spec)
    }
}
