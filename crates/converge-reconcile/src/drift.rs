//! Drift detection
//!
//! Compares a recorded state against a freshly fetched one. The fresh state
//! always wins; drift is reported so the caller can show what changed
//! outside its control.

use std::fmt;

use converge_rbac::RoleState;

/// Placeholder rendered for an absent optional value.
const NONE: &str = "<none>";

/// One attribute whose remote value no longer matches the recorded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
    /// Attribute name.
    pub attribute: &'static str,
    /// Value in the recorded state.
    pub recorded: String,
    /// Value the remote holds now.
    pub observed: String,
}

impl Drift {
    /// Create a drift entry.
    pub fn new(
        attribute: &'static str,
        recorded: impl Into<String>,
        observed: impl Into<String>,
    ) -> Self {
        Self {
            attribute,
            recorded: recorded.into(),
            observed: observed.into(),
        }
    }
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.attribute, self.recorded, self.observed)
    }
}

/// List the role attributes that differ between `prior` and `fresh`.
///
/// The identifier is not compared; it never changes for a live role.
pub fn detect_role_drift(prior: &RoleState, fresh: &RoleState) -> Vec<Drift> {
    let mut drift = Vec::new();

    if prior.name != fresh.name {
        drift.push(Drift::new("name", prior.name.as_str(), fresh.name.as_str()));
    }

    if prior.description != fresh.description {
        drift.push(Drift::new(
            "description",
            prior.description.as_deref().unwrap_or(NONE),
            fresh.description.as_deref().unwrap_or(NONE),
        ));
    }

    if prior.permissions != fresh.permissions {
        drift.push(Drift::new(
            "permissions",
            format!("{:?}", prior.permissions.to_strings()),
            format!("{:?}", fresh.permissions.to_strings()),
        ));
    }

    drift
}
