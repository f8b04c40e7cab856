//! User role assignments
//!
//! An assignment links a user to a role. It has no identity of its own on
//! the remote side: the (user, role) pair is the whole key and the whole
//! record. Changing either half means a different assignment.

use serde::{Deserialize, Serialize};

/// Declared assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AssignmentSpec {
    /// User identifier.
    pub user_id: String,

    /// Role identifier.
    pub role_id: String,
}

impl AssignmentSpec {
    /// Create a new assignment spec.
    pub fn new(user_id: impl Into<String>, role_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role_id: role_id.into(),
        }
    }
}

/// Persisted state record for an assignment.
///
/// Layout: `{id, user_id, role_id}`, where `id` is the composite identifier
/// built from the two halves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AssignmentState {
    /// Composite identifier.
    pub id: String,

    /// User identifier.
    pub user_id: String,

    /// Role identifier.
    pub role_id: String,
}

impl AssignmentState {
    /// Check whether moving to `spec` would change either half.
    pub fn differs_from(&self, spec: &AssignmentSpec) -> bool {
        self.user_id != spec.user_id || self.role_id != spec.role_id
    }

    /// The declared form of this record.
    pub fn to_spec(&self) -> AssignmentSpec {
        AssignmentSpec::new(self.user_id.clone(), self.role_id.clone())
    }
}

/// Request body for assigning a role to a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignRole {
    /// Role identifier.
    pub role_id: String,
}
