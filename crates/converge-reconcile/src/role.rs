//! Role reconciliation
//!
//! Roles carry a remote-assigned identifier. Every state this module returns
//! is built from the remote payload alone, so a read after a create reports
//! exactly what the create reported. The one exception is the identifier:
//! once stored, or supplied for import, it is kept verbatim.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use converge_gateway::{GatewayResponse, RemoteGateway};
use converge_rbac::{NewRole, RemoteRole, RolePatch, RoleSpec, RoleState};
use tracing::{debug, info, instrument};

use crate::context::InvocationContext;
use crate::drift::detect_role_drift;
use crate::error::{Operation, ReconcileError, ReconcileResult, ResourceKind};
use crate::reconciler::{ReadOutcome, Reconciler};

const KIND: ResourceKind = ResourceKind::Role;

/// Reconciler for custom roles.
#[derive(Clone)]
pub struct RoleReconciler {
    gateway: Arc<dyn RemoteGateway>,
}

impl fmt::Debug for RoleReconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleReconciler").finish_non_exhaustive()
    }
}

impl RoleReconciler {
    /// Create a reconciler over `gateway`.
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self { gateway }
    }

    /// Fetch a role for read-only consumers.
    ///
    /// Unlike [`Reconciler::read`], a missing role is an error here.
    #[instrument(skip(self, ctx))]
    pub async fn lookup(&self, ctx: &InvocationContext, id: &str) -> ReconcileResult<RoleState> {
        self.fetch(ctx, Operation::Lookup, id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound {
                kind: KIND,
                id: id.to_string(),
            })
    }

    /// Fetch a role, mapping `NotFound` to `None`.
    async fn fetch(
        &self,
        ctx: &InvocationContext,
        operation: Operation,
        id: &str,
    ) -> ReconcileResult<Option<RoleState>> {
        debug!(role_id = %id, %operation, "Fetching role");

        match ctx.run(KIND, operation, self.gateway.fetch_role(id)).await? {
            GatewayResponse::NotFound => Ok(None),
            response => accept(operation, response).map(Some),
        }
    }
}

/// Turn a role-bearing response into state, or fail with `Protocol`.
fn accept(operation: Operation, response: GatewayResponse<RemoteRole>) -> ReconcileResult<RoleState> {
    match response {
        GatewayResponse::Ok(remote) if remote.id.is_nil() => Err(ReconcileError::Protocol {
            kind: KIND,
            operation,
            status: 200,
            message: "response is missing the role identifier".to_string(),
        }),
        GatewayResponse::Ok(remote) => Ok(RoleState::from(remote)),
        other => Err(ReconcileError::unexpected(KIND, operation, other)),
    }
}

fn validate(spec: &RoleSpec) -> ReconcileResult<()> {
    spec.validate()
        .map_err(|source| ReconcileError::InvalidSpec { kind: KIND, source })
}

#[async_trait]
impl Reconciler for RoleReconciler {
    type Spec = RoleSpec;
    type State = RoleState;

    fn kind(&self) -> ResourceKind {
        KIND
    }

    #[instrument(skip_all, fields(name = %spec.name))]
    async fn create(&self, ctx: &InvocationContext, spec: &RoleSpec) -> ReconcileResult<RoleState> {
        validate(spec)?;

        let body = NewRole::from(spec);
        let response = ctx
            .run(KIND, Operation::Create, self.gateway.create_role(&body))
            .await?;
        let state = accept(Operation::Create, response)?;

        info!(role_id = %state.id, name = %state.name, "Created role");
        Ok(state)
    }

    #[instrument(skip_all, fields(role_id = %state.id))]
    async fn read(
        &self,
        ctx: &InvocationContext,
        state: &RoleState,
    ) -> ReconcileResult<ReadOutcome<RoleState>> {
        let Some(mut fresh) = self.fetch(ctx, Operation::Read, &state.id).await? else {
            info!(role_id = %state.id, "Role no longer exists remotely; removing from state");
            return Ok(ReadOutcome::Removed);
        };

        fresh.id = state.id.clone();
        let drift = detect_role_drift(state, &fresh);
        for entry in &drift {
            info!(role_id = %state.id, drift = %entry, "Role drifted outside of management");
        }

        Ok(ReadOutcome::Present {
            state: fresh,
            drift,
        })
    }

    #[instrument(skip_all, fields(role_id = %state.id))]
    async fn update(
        &self,
        ctx: &InvocationContext,
        state: &RoleState,
        spec: &RoleSpec,
    ) -> ReconcileResult<RoleState> {
        validate(spec)?;

        let patch = RolePatch::from(spec);
        let response = ctx
            .run(
                KIND,
                Operation::Update,
                self.gateway.update_role(&state.id, &patch),
            )
            .await?;
        let mut updated = accept(Operation::Update, response)?;
        updated.id = state.id.clone();

        info!(role_id = %updated.id, "Updated role");
        Ok(updated)
    }

    #[instrument(skip_all, fields(role_id = %state.id))]
    async fn delete(&self, ctx: &InvocationContext, state: &RoleState) -> ReconcileResult<()> {
        match ctx
            .run(KIND, Operation::Delete, self.gateway.delete_role(&state.id))
            .await?
        {
            GatewayResponse::Ok(()) => {
                info!(role_id = %state.id, "Deleted role");
                Ok(())
            }
            GatewayResponse::NotFound => {
                info!(role_id = %state.id, "Role already absent");
                Ok(())
            }
            other => Err(ReconcileError::unexpected(KIND, Operation::Delete, other)),
        }
    }

    #[instrument(skip(self, ctx))]
    async fn import(
        &self,
        ctx: &InvocationContext,
        id: &str,
    ) -> ReconcileResult<ReadOutcome<RoleState>> {
        match self.fetch(ctx, Operation::Import, id).await? {
            Some(mut state) => {
                state.id = id.to_string();
                info!(role_id = %state.id, "Imported role");
                Ok(ReadOutcome::unchanged(state))
            }
            None => {
                info!(role_id = %id, "Cannot import non-existent role");
                Ok(ReadOutcome::Removed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge_gateway::{Fault, GatewayCall, MemoryGateway};
    use converge_rbac::PermissionList;
    use uuid::Uuid;

    fn setup() -> (MemoryGateway, RoleReconciler) {
        let gateway = MemoryGateway::new();
        let reconciler = RoleReconciler::new(Arc::new(gateway.clone()));
        (gateway, reconciler)
    }

    fn test_spec() -> RoleSpec {
        RoleSpec::new("Test Role")
            .with_description("Test Description")
            .with_permissions(PermissionList::from_strings(&["agents:read", "agents:write"]))
    }

    // =========================================================================
    // Create
    // =========================================================================

    #[tokio::test]
    async fn test_create_then_read_matches() {
        let (_, reconciler) = setup();
        let ctx = InvocationContext::new();

        let created = reconciler.create(&ctx, &test_spec()).await.unwrap();
        assert!(Uuid::parse_str(&created.id).is_ok());
        assert!(created.matches_spec(&test_spec()));

        let outcome = reconciler.read(&ctx, &created).await.unwrap();
        assert!(!outcome.has_drift());
        assert_eq!(outcome.into_state(), Some(created));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name_locally() {
        let (gateway, reconciler) = setup();

        let err = reconciler
            .create(&InvocationContext::new(), &RoleSpec::new(" "))
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::InvalidSpec { .. }));
        assert!(gateway.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_transport_failure_writes_nothing() {
        let (gateway, reconciler) = setup();
        gateway
            .fail_next(Fault::Transport("connection refused".to_string()))
            .await;

        let err = reconciler
            .create(&InvocationContext::new(), &test_spec())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Transport {
                operation: Operation::Create,
                ..
            }
        ));
        assert_eq!(gateway.role_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_unexpected_status() {
        let (gateway, reconciler) = setup();
        gateway.fail_next(Fault::Status(500)).await;

        let err = reconciler
            .create(&InvocationContext::new(), &test_spec())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_nil_identifier_is_protocol_error() {
        let response = GatewayResponse::Ok(RemoteRole {
            id: Uuid::nil(),
            name: "Test Role".to_string(),
            description: None,
            permissions: PermissionList::new(),
        });

        let err = accept(Operation::Create, response).unwrap_err();
        assert!(matches!(err, ReconcileError::Protocol { status: 200, .. }));
    }

    // =========================================================================
    // Read
    // =========================================================================

    #[tokio::test]
    async fn test_read_reports_drift_and_overwrites() {
        let (gateway, reconciler) = setup();
        let ctx = InvocationContext::new();
        let created = reconciler.create(&ctx, &test_spec()).await.unwrap();

        let id = Uuid::parse_str(&created.id).unwrap();
        assert!(
            gateway
                .modify_role(id, |role| {
                    role.description = None;
                    role.permissions = PermissionList::from_strings(&["agents:read"]);
                })
                .await
        );

        let ReadOutcome::Present { state, drift } = reconciler.read(&ctx, &created).await.unwrap()
        else {
            panic!("role should still exist");
        };

        assert_eq!(state.description, None);
        assert_eq!(state.permissions.to_strings(), vec!["agents:read"]);
        let attributes: Vec<_> = drift.iter().map(|d| d.attribute).collect();
        assert_eq!(attributes, vec!["description", "permissions"]);
    }

    #[tokio::test]
    async fn test_read_missing_role_is_removed() {
        let (gateway, reconciler) = setup();
        let ctx = InvocationContext::new();
        let created = reconciler.create(&ctx, &test_spec()).await.unwrap();

        gateway
            .remove_role(Uuid::parse_str(&created.id).unwrap())
            .await;

        assert!(reconciler.read(&ctx, &created).await.unwrap().is_removed());
    }

    #[tokio::test]
    async fn test_read_unexpected_status() {
        let (gateway, reconciler) = setup();
        let ctx = InvocationContext::new();
        let created = reconciler.create(&ctx, &test_spec()).await.unwrap();

        gateway.fail_next(Fault::Status(503)).await;
        let err = reconciler.read(&ctx, &created).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Protocol {
                operation: Operation::Read,
                status: 503,
                ..
            }
        ));
    }

    // =========================================================================
    // Update
    // =========================================================================

    #[tokio::test]
    async fn test_update_permissions_keeps_description() {
        let (_, reconciler) = setup();
        let ctx = InvocationContext::new();
        let created = reconciler.create(&ctx, &test_spec()).await.unwrap();

        let desired = RoleSpec::new("Test Role")
            .with_permissions(PermissionList::from_strings(&["mcp_servers:read"]));
        let updated = reconciler.update(&ctx, &created, &desired).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.permissions.to_strings(), vec!["mcp_servers:read"]);
        assert_eq!(updated.description.as_deref(), Some("Test Description"));
    }

    #[tokio::test]
    async fn test_update_missing_role_fails() {
        let (gateway, reconciler) = setup();
        let ctx = InvocationContext::new();
        let created = reconciler.create(&ctx, &test_spec()).await.unwrap();
        gateway
            .remove_role(Uuid::parse_str(&created.id).unwrap())
            .await;

        let err = reconciler
            .update(&ctx, &created, &test_spec())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    // =========================================================================
    // Delete
    // =========================================================================

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (gateway, reconciler) = setup();
        let ctx = InvocationContext::new();
        let created = reconciler.create(&ctx, &test_spec()).await.unwrap();

        reconciler.delete(&ctx, &created).await.unwrap();
        reconciler.delete(&ctx, &created).await.unwrap();

        assert_eq!(gateway.role_count().await, 0);
        assert!(reconciler.read(&ctx, &created).await.unwrap().is_removed());
    }

    #[tokio::test]
    async fn test_delete_rejected() {
        let (gateway, reconciler) = setup();
        let ctx = InvocationContext::new();
        let created = reconciler.create(&ctx, &test_spec()).await.unwrap();

        gateway.fail_next(Fault::Status(409)).await;
        let err = reconciler.delete(&ctx, &created).await.unwrap_err();

        assert_eq!(err.status(), Some(409));
        assert_eq!(gateway.role_count().await, 1);
    }

    // =========================================================================
    // Import and lookup
    // =========================================================================

    #[tokio::test]
    async fn test_import_existing_role() {
        let (gateway, reconciler) = setup();
        let id = Uuid::now_v7();
        gateway
            .insert_role(RemoteRole {
                id,
                name: "Imported".to_string(),
                description: None,
                permissions: PermissionList::from_strings(&["agents:read"]),
            })
            .await;

        let outcome = reconciler
            .import(&InvocationContext::new(), &id.to_string())
            .await
            .unwrap();
        let state = outcome.into_state().unwrap();
        assert_eq!(state.id, id.to_string());
        assert_eq!(state.name, "Imported");
    }

    #[tokio::test]
    async fn test_import_keeps_supplied_id() {
        let (gateway, reconciler) = setup();
        let ctx = InvocationContext::new();
        let id = Uuid::now_v7();
        gateway
            .insert_role(RemoteRole {
                id,
                name: "Imported".to_string(),
                description: None,
                permissions: PermissionList::from_strings(&["agents:read"]),
            })
            .await;

        let supplied = id.to_string().to_uppercase();
        let state = reconciler
            .import(&ctx, &supplied)
            .await
            .unwrap()
            .into_state()
            .unwrap();
        assert_eq!(state.id, supplied);

        let outcome = reconciler.read(&ctx, &state).await.unwrap();
        assert!(!outcome.has_drift());
        assert_eq!(outcome.into_state().unwrap().id, supplied);

        let desired = RoleSpec::new("Imported")
            .with_permissions(PermissionList::from_strings(&["agents:write"]));
        let updated = reconciler.update(&ctx, &state, &desired).await.unwrap();
        assert_eq!(updated.id, supplied);
        assert_eq!(updated.permissions.to_strings(), vec!["agents:write"]);
    }

    #[tokio::test]
    async fn test_import_missing_role_is_removed() {
        let (_, reconciler) = setup();
        let outcome = reconciler
            .import(&InvocationContext::new(), &Uuid::now_v7().to_string())
            .await
            .unwrap();
        assert!(outcome.is_removed());
    }

    #[tokio::test]
    async fn test_lookup_missing_role_is_error() {
        let (_, reconciler) = setup();
        let id = Uuid::now_v7().to_string();

        let err = reconciler
            .lookup(&InvocationContext::new(), &id)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound { id: ref found, .. } if *found == id));
    }

    #[tokio::test]
    async fn test_cancelled_context_makes_no_call() {
        let (gateway, reconciler) = setup();
        let ctx = InvocationContext::new();
        ctx.cancel();

        let err = reconciler.create(&ctx, &test_spec()).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Cancelled { .. }));
        assert!(gateway.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_requires_no_replacement() {
        let (gateway, reconciler) = setup();
        let ctx = InvocationContext::new();
        let created = reconciler.create(&ctx, &test_spec()).await.unwrap();

        assert!(!reconciler.requires_replacement(&created, &RoleSpec::new("Renamed")));
        assert_eq!(reconciler.kind(), ResourceKind::Role);
        assert!(matches!(
            gateway.calls().await.as_slice(),
            [GatewayCall::CreateRole(name)] if name == "Test Role"
        ));
    }
}
