//! # Permissions
//!
//! Permission tokens granted by a role. A token is an opaque string such as
//! `agents:read`; the remote API owns the vocabulary, so tokens are carried
//! verbatim and never rejected locally.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the resource and action halves of a token.
const TOKEN_SEPARATOR: char = ':';

/// A single permission token.
///
/// Most tokens follow a `resource:action` shape. [`Permission::resource`] and
/// [`Permission::action`] expose that view when it is present, but a token
/// that does not follow it is still a valid permission.
///
/// # Example
///
/// ```
/// use converge_rbac::permissions::Permission;
///
/// let perm = Permission::new("agents:read");
/// assert_eq!(perm.as_str(), "agents:read");
/// assert_eq!(perm.resource(), Some("agents"));
/// assert_eq!(perm.action(), Some("read"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Read access to agents.
    pub const AGENTS_READ: &'static str = "agents:read";

    /// Write access to agents.
    pub const AGENTS_WRITE: &'static str = "agents:write";

    /// Read access to MCP servers.
    pub const MCP_SERVERS_READ: &'static str = "mcp_servers:read";

    /// Create a permission from its token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The resource half of a `resource:action` token.
    pub fn resource(&self) -> Option<&str> {
        self.0
            .split_once(TOKEN_SEPARATOR)
            .map(|(resource, _)| resource)
            .filter(|resource| !resource.is_empty())
    }

    /// The action half of a `resource:action` token.
    pub fn action(&self) -> Option<&str> {
        self.0
            .split_once(TOKEN_SEPARATOR)
            .map(|(_, action)| action)
            .filter(|action| !action.is_empty())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Permission {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Permission {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// The ordered permission list of a role.
///
/// Order is kept exactly as declared or as reported by the remote system.
/// Equality is order-sensitive: `[a, b]` and `[b, a]` compare unequal, which
/// is how a declared list is checked against what the remote returned.
///
/// # Example
///
/// ```
/// use converge_rbac::permissions::PermissionList;
///
/// let list = PermissionList::from_strings(&["agents:read", "agents:write"]);
/// assert_eq!(list.len(), 2);
/// assert_eq!(list.to_strings()[1], "agents:write");
/// assert_ne!(list, PermissionList::from_strings(&["agents:write", "agents:read"]));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PermissionList {
    permissions: Vec<Permission>,
}

impl PermissionList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            permissions: Vec::new(),
        }
    }

    /// Build a list from string tokens.
    pub fn from_strings(tokens: &[&str]) -> Self {
        tokens.iter().map(|token| Permission::new(*token)).collect()
    }

    /// Iterate in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Permission> {
        self.permissions.iter()
    }

    /// Tokens as plain strings, in order.
    pub fn to_strings(&self) -> Vec<String> {
        self.permissions.iter().map(|p| p.as_str().to_string()).collect()
    }

    /// Number of permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl FromIterator<Permission> for PermissionList {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Permission>> for PermissionList {
    fn from(permissions: Vec<Permission>) -> Self {
        Self { permissions }
    }
}

impl<'a> IntoIterator for &'a PermissionList {
    type Item = &'a Permission;
    type IntoIter = std::slice::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.permissions.iter()
    }
}
