//! The remote gateway contract.

use async_trait::async_trait;
use converge_rbac::{NewRole, RemoteRole, RolePatch};

use crate::response::{GatewayResponse, GatewayResult};

/// One atomic remote operation per method.
///
/// Implementations perform exactly one logical request per call and never
/// interpret the answer beyond sorting it into a [`GatewayResponse`].
/// Dropping a returned future must abort the in-flight request.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Fetch a role by identifier.
    async fn fetch_role(&self, id: &str) -> GatewayResult<GatewayResponse<RemoteRole>>;

    /// Create a role; the remote assigns the identifier.
    async fn create_role(&self, role: &NewRole) -> GatewayResult<GatewayResponse<RemoteRole>>;

    /// Partially update a role.
    async fn update_role(
        &self,
        id: &str,
        patch: &RolePatch,
    ) -> GatewayResult<GatewayResponse<RemoteRole>>;

    /// Delete a role.
    async fn delete_role(&self, id: &str) -> GatewayResult<GatewayResponse<()>>;

    /// List every role assigned to a user.
    async fn list_roles_for_user(
        &self,
        user_id: &str,
    ) -> GatewayResult<GatewayResponse<Vec<RemoteRole>>>;

    /// Assign a role to a user. Success carries no payload.
    async fn create_assignment(
        &self,
        user_id: &str,
        role_id: &str,
    ) -> GatewayResult<GatewayResponse<()>>;

    /// Remove a role from a user.
    async fn delete_assignment(
        &self,
        user_id: &str,
        role_id: &str,
    ) -> GatewayResult<GatewayResponse<()>>;
}
