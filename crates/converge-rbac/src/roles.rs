//! Role records
//!
//! A role is a named permission list owned by the remote system. This module
//! holds the three shapes a role takes during reconciliation: the declared
//! [`RoleSpec`], the [`RemoteRole`] payload the API reports, and the
//! persisted [`RoleState`]. It also holds the request bodies sent to the API.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::permissions::PermissionList;

/// Validation errors for declared records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecError {
    /// A required attribute is empty.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Attribute name.
        field: &'static str,
    },
}

/// Declared (desired) attributes of a role.
///
/// # Examples
///
/// ```
/// use converge_rbac::{PermissionList, RoleSpec};
///
/// let spec = RoleSpec::new("Auditor")
///     .with_description("Read-only access")
///     .with_permissions(PermissionList::from_strings(&["agents:read"]));
/// assert!(spec.validate().is_ok());
/// assert!(RoleSpec::new("  ").validate().is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleSpec {
    /// Role name (required, non-empty).
    pub name: String,

    /// Optional description. `None` means "not declared".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ordered permission tokens; may be empty.
    #[serde(default)]
    pub permissions: PermissionList,
}

impl RoleSpec {
    /// Create a spec with a name and no permissions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            permissions: PermissionList::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the permission list.
    pub fn with_permissions(mut self, permissions: PermissionList) -> Self {
        self.permissions = permissions;
        self
    }

    /// Check local invariants before any remote call.
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.name.trim().is_empty() {
            return Err(SpecError::EmptyField { field: "name" });
        }
        Ok(())
    }
}

/// A role as reported by the remote API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRole {
    /// Remote-assigned identifier.
    pub id: Uuid,

    /// Role name.
    pub name: String,

    /// Description, if the remote holds one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Permission tokens in remote order.
    #[serde(default)]
    pub permissions: PermissionList,
}

impl RemoteRole {
    /// Check whether this role carries the given identifier.
    ///
    /// UUID identifiers are compared by value, so letter case and hyphen
    /// placement in `id` do not matter. Anything else is compared verbatim.
    pub fn has_id(&self, id: &str) -> bool {
        match Uuid::parse_str(id) {
            Ok(parsed) => parsed == self.id,
            Err(_) => self.id.to_string() == id,
        }
    }
}

/// Persisted state record for a role.
///
/// Layout: `{id, name, description?, permissions}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleState {
    /// Remote identifier, string form.
    pub id: String,

    /// Role name.
    pub name: String,

    /// Description; absent when the remote holds none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Permission tokens.
    #[serde(default)]
    pub permissions: PermissionList,
}

impl RoleState {
    /// Build a state record entirely from a remote payload.
    ///
    /// Every attribute comes from `remote`; nothing is carried over from a
    /// previous record.
    pub fn from_remote(remote: &RemoteRole) -> Self {
        Self {
            id: remote.id.to_string(),
            name: remote.name.clone(),
            description: remote.description.clone(),
            permissions: remote.permissions.clone(),
        }
    }

    /// Check whether the recorded attributes already match a declared spec.
    ///
    /// A spec without a description leaves the recorded description alone,
    /// so it never counts as a difference.
    pub fn matches_spec(&self, spec: &RoleSpec) -> bool {
        self.name == spec.name
            && self.permissions == spec.permissions
            && (spec.description.is_none() || self.description == spec.description)
    }
}

impl From<RemoteRole> for RoleState {
    fn from(remote: RemoteRole) -> Self {
        Self {
            id: remote.id.to_string(),
            name: remote.name,
            description: remote.description,
            permissions: remote.permissions,
        }
    }
}

/// Request body for creating a role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewRole {
    /// Role name.
    pub name: String,

    /// Description, sent only when declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Permission tokens.
    pub permissions: PermissionList,
}

impl From<&RoleSpec> for NewRole {
    fn from(spec: &RoleSpec) -> Self {
        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            permissions: spec.permissions.clone(),
        }
    }
}

/// Request body for a partial role update.
///
/// Name and permissions are always sent. The description is sent only when
/// declared; leaving it out means "keep whatever the remote has". There is no
/// way to express "clear the description" through this body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RolePatch {
    /// Role name.
    pub name: String,

    /// Description, sent only when declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Permission tokens.
    pub permissions: PermissionList,
}

impl From<&RoleSpec> for RolePatch {
    fn from(spec: &RoleSpec) -> Self {
        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            permissions: spec.permissions.clone(),
        }
    }
}
