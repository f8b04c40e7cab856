//! # Converge RBAC
//!
//! Records for declaratively managed role-based access control objects.
//!
//! ## Overview
//!
//! The converge-rbac crate holds:
//! - **Permissions**: Opaque permission tokens and ordered permission lists
//! - **Roles**: Declared specs, remote payloads, and persisted state records
//! - **Assignments**: User-to-role links keyed only by the (user, role) pair
//!
//! ## Record Shapes
//!
//! ```text
//! RoleSpec        (declared)  -> NewRole / RolePatch (request bodies)
//! RemoteRole      (reported)  -> RoleState          (persisted)
//!
//! AssignmentSpec  (declared)  -> AssignmentState    (persisted, composite id)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use converge_rbac::{PermissionList, RoleSpec};
//!
//! let spec = RoleSpec::new("Test Role")
//!     .with_description("Test Description")
//!     .with_permissions(PermissionList::from_strings(&["agents:read", "agents:write"]));
//!
//! assert!(spec.validate().is_ok());
//! assert_eq!(spec.permissions.len(), 2);
//! ```

pub mod assignments;
pub mod permissions;
pub mod roles;

// Re-export main types for convenience
pub use assignments::{AssignRole, AssignmentSpec, AssignmentState};
pub use permissions::{Permission, PermissionList};
pub use roles::{NewRole, RemoteRole, RolePatch, RoleSpec, RoleState, SpecError};
