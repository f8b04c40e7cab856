//! # Converge Reconcile
//!
//! Lifecycle reconciliation of RBAC objects against a remote administrative API.
//!
//! ## Overview
//!
//! The converge-reconcile crate provides:
//! - **Reconcilers**: [`RoleReconciler`] and [`AssignmentReconciler`], both
//!   implementing the [`Reconciler`] lifecycle trait
//! - **Identity**: composite identifiers for resources without a remote id
//! - **Drift**: detection of out-of-band changes during reads
//! - **Context**: caller-owned cancellation and deadlines per invocation
//!
//! ## Lifecycle
//!
//! ```text
//! Absent -> create -> Present -> read ... -> update -> Present -> delete -> Absent
//!                        |
//!                        +-- read finds nothing --> Removed (caller purges state)
//! ```
//!
//! A reconciler holds no state of its own. The caller passes the declared
//! spec and the recorded state in, and persists whatever comes back.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use converge_gateway::{GatewayConfig, HttpGateway};
//! use converge_rbac::{PermissionList, RoleSpec};
//! use converge_reconcile::{InvocationContext, ReadOutcome, Reconciler, RoleReconciler};
//!
//! async fn converge() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Arc::new(HttpGateway::new(&GatewayConfig::from_env())?);
//!     let roles = RoleReconciler::new(gateway);
//!     let ctx = InvocationContext::new();
//!
//!     let spec = RoleSpec::new("Auditor")
//!         .with_permissions(PermissionList::from_strings(&["agents:read"]));
//!     let state = roles.create(&ctx, &spec).await?;
//!
//!     match roles.read(&ctx, &state).await? {
//!         ReadOutcome::Present { drift, .. } if !drift.is_empty() => {
//!             println!("{} drifted attributes", drift.len())
//!         }
//!         ReadOutcome::Present { .. } => println!("in sync"),
//!         ReadOutcome::Removed => println!("deleted out of band"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod assignment;
pub mod context;
pub mod drift;
pub mod error;
pub mod identity;
pub mod reconciler;
pub mod role;

// Re-export main types
pub use assignment::AssignmentReconciler;
pub use context::InvocationContext;
pub use drift::{detect_role_drift, Drift};
pub use error::{Operation, ReconcileError, ReconcileResult, ResourceKind};
pub use identity::{CompositeId, IdentityError};
pub use reconciler::{ReadOutcome, Reconciler};
pub use role::RoleReconciler;
