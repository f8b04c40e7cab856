//! # Converge Gateway
//!
//! The boundary between the reconcilers and the remote administrative API.
//!
//! ## Overview
//!
//! The converge-gateway crate provides:
//! - **Contract**: the [`RemoteGateway`] trait, one atomic remote operation per method
//! - **Responses**: [`GatewayResponse`], a single tagged outcome per call
//! - **HTTP**: [`HttpGateway`], a reqwest implementation of the contract
//! - **Memory**: [`MemoryGateway`], an in-memory implementation for tests
//! - **Configuration**: [`GatewayConfig`], loaded from the environment
//! - **Retry**: exponential backoff for idempotent requests
//!
//! ## Outcomes
//!
//! ```text
//! Err(TransportError)                  no HTTP answer (connect, timeout, ...)
//! Ok(GatewayResponse::Ok(payload))     2xx with the expected payload
//! Ok(GatewayResponse::NotFound)        404
//! Ok(GatewayResponse::Unexpected{..})  any other status, or an undecodable body
//! ```
//!
//! ## HTTP Surface
//!
//! | Operation             | Request                                |
//! |-----------------------|----------------------------------------|
//! | `fetch_role`          | `GET /api/roles/{id}`                  |
//! | `create_role`         | `POST /api/roles`                      |
//! | `update_role`         | `PUT /api/roles/{id}`                  |
//! | `delete_role`         | `DELETE /api/roles/{id}`               |
//! | `list_roles_for_user` | `GET /api/users/{user}/roles`          |
//! | `create_assignment`   | `POST /api/users/{user}/roles`         |
//! | `delete_assignment`   | `DELETE /api/users/{user}/roles/{role}`|
//!
//! ## Usage
//!
//! ```rust,no_run
//! use converge_gateway::{GatewayConfig, GatewayResponse, HttpGateway, RemoteGateway};
//!
//! async fn show(id: &str) -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = HttpGateway::new(&GatewayConfig::from_env())?;
//!
//!     match gateway.fetch_role(id).await? {
//!         GatewayResponse::Ok(role) => println!("{} has {} permissions", role.name, role.permissions.len()),
//!         GatewayResponse::NotFound => println!("{} does not exist", id),
//!         other => println!("unexpected answer: {}", other),
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod response;
pub mod retry;

// Re-export main types
pub use config::{ApiEndpoint, ConfigError, GatewayConfig};
pub use gateway::RemoteGateway;
pub use http::HttpGateway;
pub use memory::{Fault, GatewayCall, MemoryGateway};
pub use response::{GatewayResponse, GatewayResult, TransportError};
pub use retry::{with_retry_if, RetryConfig};
