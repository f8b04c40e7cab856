//! In-memory gateway.
//!
//! A [`RemoteGateway`] backed by maps instead of HTTP. Suitable for tests
//! and local experiments: it records every call it receives and can be told
//! to fail the next call with a transport error or an arbitrary status.

use async_trait::async_trait;
use converge_rbac::{NewRole, RemoteRole, RolePatch};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::gateway::RemoteGateway;
use crate::response::{GatewayResponse, GatewayResult, TransportError};

/// A call received by the in-memory gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// `fetch_role(id)`
    FetchRole(String),
    /// `create_role(name)`
    CreateRole(String),
    /// `update_role(id)`
    UpdateRole(String),
    /// `delete_role(id)`
    DeleteRole(String),
    /// `list_roles_for_user(user_id)`
    ListRolesForUser(String),
    /// `create_assignment(user_id, role_id)`
    CreateAssignment(String, String),
    /// `delete_assignment(user_id, role_id)`
    DeleteAssignment(String, String),
}

/// A failure to inject into the next call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail with [`TransportError::Unavailable`].
    Transport(String),
    /// Answer with this status instead of performing the call.
    Status(u16),
}

#[derive(Debug, Default)]
struct State {
    roles: HashMap<Uuid, RemoteRole>,
    /// Known users and the role ids assigned to them, in assignment order.
    users: HashMap<String, Vec<String>>,
    faults: VecDeque<Fault>,
    calls: Vec<GatewayCall>,
    ignore_assignment_writes: bool,
}

/// In-memory gateway implementation.
#[derive(Debug, Clone, Default)]
pub struct MemoryGateway {
    state: Arc<RwLock<State>>,
}

impl MemoryGateway {
    /// Create an empty gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user so role assignments can target it.
    pub async fn add_user(&self, user_id: impl Into<String>) {
        self.state.write().await.users.entry(user_id.into()).or_default();
    }

    /// Insert a role directly, bypassing `create_role`.
    pub async fn insert_role(&self, role: RemoteRole) {
        self.state.write().await.roles.insert(role.id, role);
    }

    /// Replace a stored role, simulating an out-of-band change.
    pub async fn modify_role<F>(&self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut RemoteRole),
    {
        match self.state.write().await.roles.get_mut(&id) {
            Some(role) => {
                f(role);
                true
            }
            None => false,
        }
    }

    /// Remove a role directly, simulating an out-of-band deletion.
    pub async fn remove_role(&self, id: Uuid) -> Option<RemoteRole> {
        self.state.write().await.roles.remove(&id)
    }

    /// Remove an assignment directly, simulating an out-of-band deletion.
    pub async fn revoke(&self, user_id: &str, role_id: &str) {
        if let Some(roles) = self.state.write().await.users.get_mut(user_id) {
            roles.retain(|r| r != role_id);
        }
    }

    /// Fail the next call with `fault`. Faults queue up in order.
    pub async fn fail_next(&self, fault: Fault) {
        self.state.write().await.faults.push_back(fault);
    }

    /// Accept assignment writes without storing them.
    pub async fn ignore_assignment_writes(&self, ignore: bool) {
        self.state.write().await.ignore_assignment_writes = ignore;
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.state.read().await.calls.clone()
    }

    /// Role ids currently assigned to a user.
    pub async fn assigned_roles(&self, user_id: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .users
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of stored roles.
    pub async fn role_count(&self) -> usize {
        self.state.read().await.roles.len()
    }

    /// Record the call and pop a pending fault, if any.
    async fn begin<T>(&self, call: GatewayCall) -> GatewayResult<Option<GatewayResponse<T>>> {
        let mut state = self.state.write().await;
        state.calls.push(call);

        match state.faults.pop_front() {
            Some(Fault::Transport(message)) => Err(TransportError::Unavailable(message)),
            Some(Fault::Status(404)) => Ok(Some(GatewayResponse::NotFound)),
            Some(Fault::Status(status)) => Ok(Some(GatewayResponse::unexpected(
                status,
                "injected failure",
            ))),
            None => Ok(None),
        }
    }
}

fn parse_role_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn fetch_role(&self, id: &str) -> GatewayResult<GatewayResponse<RemoteRole>> {
        if let Some(injected) = self.begin(GatewayCall::FetchRole(id.to_string())).await? {
            return Ok(injected);
        }

        let state = self.state.read().await;
        Ok(parse_role_id(id)
            .and_then(|uuid| state.roles.get(&uuid))
            .cloned()
            .map_or(GatewayResponse::NotFound, GatewayResponse::Ok))
    }

    async fn create_role(&self, role: &NewRole) -> GatewayResult<GatewayResponse<RemoteRole>> {
        if let Some(injected) = self.begin(GatewayCall::CreateRole(role.name.clone())).await? {
            return Ok(injected);
        }

        let created = RemoteRole {
            id: Uuid::now_v7(),
            name: role.name.clone(),
            description: role.description.clone(),
            permissions: role.permissions.clone(),
        };
        self.state.write().await.roles.insert(created.id, created.clone());
        Ok(GatewayResponse::Ok(created))
    }

    async fn update_role(
        &self,
        id: &str,
        patch: &RolePatch,
    ) -> GatewayResult<GatewayResponse<RemoteRole>> {
        if let Some(injected) = self.begin(GatewayCall::UpdateRole(id.to_string())).await? {
            return Ok(injected);
        }

        let Some(uuid) = parse_role_id(id) else {
            return Ok(GatewayResponse::NotFound);
        };
        let mut state = self.state.write().await;
        let Some(role) = state.roles.get_mut(&uuid) else {
            return Ok(GatewayResponse::NotFound);
        };

        role.name = patch.name.clone();
        role.permissions = patch.permissions.clone();
        if let Some(ref description) = patch.description {
            role.description = Some(description.clone());
        }
        Ok(GatewayResponse::Ok(role.clone()))
    }

    async fn delete_role(&self, id: &str) -> GatewayResult<GatewayResponse<()>> {
        if let Some(injected) = self.begin(GatewayCall::DeleteRole(id.to_string())).await? {
            return Ok(injected);
        }

        let mut state = self.state.write().await;
        let removed = parse_role_id(id).and_then(|uuid| state.roles.remove(&uuid));
        Ok(match removed {
            Some(_) => GatewayResponse::Ok(()),
            None => GatewayResponse::NotFound,
        })
    }

    async fn list_roles_for_user(
        &self,
        user_id: &str,
    ) -> GatewayResult<GatewayResponse<Vec<RemoteRole>>> {
        if let Some(injected) = self
            .begin(GatewayCall::ListRolesForUser(user_id.to_string()))
            .await?
        {
            return Ok(injected);
        }

        let state = self.state.read().await;
        let Some(assigned) = state.users.get(user_id) else {
            return Ok(GatewayResponse::NotFound);
        };

        // Assignments pointing at roles that no longer exist are not listed.
        let roles = assigned
            .iter()
            .filter_map(|role_id| state.roles.values().find(|role| role.has_id(role_id)))
            .cloned()
            .collect();
        Ok(GatewayResponse::Ok(roles))
    }

    async fn create_assignment(
        &self,
        user_id: &str,
        role_id: &str,
    ) -> GatewayResult<GatewayResponse<()>> {
        if let Some(injected) = self
            .begin(GatewayCall::CreateAssignment(
                user_id.to_string(),
                role_id.to_string(),
            ))
            .await?
        {
            return Ok(injected);
        }

        let mut state = self.state.write().await;
        if state.ignore_assignment_writes {
            return Ok(GatewayResponse::Ok(()));
        }

        let Some(assigned) = state.users.get_mut(user_id) else {
            return Ok(GatewayResponse::NotFound);
        };
        if !assigned.iter().any(|r| r == role_id) {
            assigned.push(role_id.to_string());
        }
        Ok(GatewayResponse::Ok(()))
    }

    async fn delete_assignment(
        &self,
        user_id: &str,
        role_id: &str,
    ) -> GatewayResult<GatewayResponse<()>> {
        if let Some(injected) = self
            .begin(GatewayCall::DeleteAssignment(
                user_id.to_string(),
                role_id.to_string(),
            ))
            .await?
        {
            return Ok(injected);
        }

        let mut state = self.state.write().await;
        let Some(assigned) = state.users.get_mut(user_id) else {
            return Ok(GatewayResponse::NotFound);
        };

        let before = assigned.len();
        assigned.retain(|r| r != role_id);
        Ok(if assigned.len() < before {
            GatewayResponse::Ok(())
        } else {
            GatewayResponse::NotFound
        })
    }
}
