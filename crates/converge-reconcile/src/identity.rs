//! Composite identifiers
//!
//! Relationship resources such as user role assignments have no identifier
//! of their own on the remote side. Their identity is the pair of foreign
//! keys, joined with [`SEPARATOR`] into one opaque string the state store can
//! key on.
//!
//! Encoding and decoding are pure and exact inverses for every valid pair:
//!
//! ```
//! use converge_reconcile::identity::{decode, encode};
//!
//! let id = encode("u1", "r1").unwrap();
//! assert_eq!(id, "u1:r1");
//! assert_eq!(decode(&id).unwrap(), ("u1".to_string(), "r1".to_string()));
//! ```

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reserved separator between the two components.
pub const SEPARATOR: char = ':';

/// Identifier validation errors. Always raised before any remote call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// A component is empty or contains the separator.
    #[error("Invalid identifier component {component:?}: {reason}")]
    InvalidComponent {
        /// The rejected component.
        component: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The identifier does not split into exactly two non-empty components.
    #[error("Malformed identifier {id:?}: expected '<user_id>:<role_id>'")]
    MalformedIdentifier {
        /// The rejected identifier.
        id: String,
    },
}

fn check_component(component: &str) -> Result<(), IdentityError> {
    if component.is_empty() {
        return Err(IdentityError::InvalidComponent {
            component: component.to_string(),
            reason: "component is empty",
        });
    }
    if component.contains(SEPARATOR) {
        return Err(IdentityError::InvalidComponent {
            component: component.to_string(),
            reason: "component contains the reserved separator",
        });
    }
    Ok(())
}

/// Join two components into a composite identifier.
pub fn encode(first: &str, second: &str) -> Result<String, IdentityError> {
    check_component(first)?;
    check_component(second)?;
    Ok(format!("{}{}{}", first, SEPARATOR, second))
}

/// Split a composite identifier into its two components.
pub fn decode(id: &str) -> Result<(String, String), IdentityError> {
    let malformed = || IdentityError::MalformedIdentifier { id: id.to_string() };

    let mut parts = id.split(SEPARATOR);
    let (Some(first), Some(second), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    if first.is_empty() || second.is_empty() {
        return Err(malformed());
    }

    Ok((first.to_string(), second.to_string()))
}

/// A validated (user, role) composite identifier.
///
/// # Examples
///
/// ```
/// use converge_reconcile::identity::CompositeId;
///
/// let id: CompositeId = "u1:r1".parse().unwrap();
/// assert_eq!(id.user(), "u1");
/// assert_eq!(id.role(), "r1");
/// assert_eq!(id.to_string(), "u1:r1");
///
/// assert!("u1".parse::<CompositeId>().is_err());
/// assert!(CompositeId::new("u:1", "r1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    user: String,
    role: String,
}

impl CompositeId {
    /// Build from components, rejecting invalid ones.
    pub fn new(user: impl Into<String>, role: impl Into<String>) -> Result<Self, IdentityError> {
        let user = user.into();
        let role = role.into();
        check_component(&user)?;
        check_component(&role)?;
        Ok(Self { user, role })
    }

    /// User component.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Role component.
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Consume into `(user, role)`.
    pub fn into_parts(self) -> (String, String) {
        (self.user, self.role)
    }
}

impl FromStr for CompositeId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user, role) = decode(s)?;
        Ok(Self { user, role })
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.user, SEPARATOR, self.role)
    }
}
