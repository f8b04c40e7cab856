//! Integration tests for the role lifecycle over HTTP.
//!
//! These tests drive `RoleReconciler` through a real `HttpGateway` against a
//! wiremock server standing in for the administrative API.

use std::sync::Arc;
use std::time::Duration;

use converge_gateway::config::{ApiEndpoint, GatewayConfig};
use converge_gateway::HttpGateway;
use converge_rbac::{PermissionList, RoleSpec, RoleState};
use converge_reconcile::{
    InvocationContext, Operation, ReadOutcome, ReconcileError, Reconciler, RoleReconciler,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROLE_ID: &str = "0190b1a2-7c3d-7e4f-8a5b-6c7d8e9f0a1b";

/// Test fixture providing a mock administrative API.
struct TestFixture {
    /// Mock API server.
    server: MockServer,
    /// Reconciler wired to the mock server.
    roles: RoleReconciler,
}

impl TestFixture {
    /// Create a new fixture with a started mock server.
    async fn new() -> Self {
        let server = MockServer::start().await;

        let config = GatewayConfig {
            endpoint: ApiEndpoint {
                base_url: server.uri(),
                api_key: Some("test-api-key".to_string()),
            },
            timeout_secs: 10,
            max_retries: 0,
            verify_tls: false,
        };
        let gateway = HttpGateway::new(&config).expect("gateway should build");

        Self {
            server,
            roles: RoleReconciler::new(Arc::new(gateway)),
        }
    }
}

fn role_json(description: Option<&str>, permissions: &[&str]) -> serde_json::Value {
    let mut role = serde_json::json!({
        "id": ROLE_ID,
        "name": "Test Role",
        "permissions": permissions,
    });
    if let Some(description) = description {
        role["description"] = description.into();
    }
    role
}

fn test_spec() -> RoleSpec {
    RoleSpec::new("Test Role")
        .with_description("Test Description")
        .with_permissions(PermissionList::from_strings(&["agents:read", "agents:write"]))
}

fn recorded_state() -> RoleState {
    RoleState {
        id: ROLE_ID.to_string(),
        name: "Test Role".to_string(),
        description: Some("Test Description".to_string()),
        permissions: PermissionList::from_strings(&["agents:read", "agents:write"]),
    }
}

// =============================================================================
// Create and read
// =============================================================================

#[tokio::test]
async fn test_create_then_read() {
    let fixture = TestFixture::new().await;
    let body = role_json(Some("Test Description"), &["agents:read", "agents:write"]);

    Mock::given(method("POST"))
        .and(path("/api/roles"))
        .and(body_json(serde_json::json!({
            "name": "Test Role",
            "description": "Test Description",
            "permissions": ["agents:read", "agents:write"],
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(&body))
        .expect(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/api/roles/{}", ROLE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&fixture.server)
        .await;

    let ctx = InvocationContext::new();
    let created = fixture.roles.create(&ctx, &test_spec()).await.unwrap();
    assert_eq!(created, recorded_state());

    let outcome = fixture.roles.read(&ctx, &created).await.unwrap();
    assert_eq!(outcome, ReadOutcome::unchanged(created));
}

#[tokio::test]
async fn test_create_uses_remote_attributes() {
    let fixture = TestFixture::new().await;

    // The remote normalizes the name; state must follow the remote.
    let mut body = role_json(None, &["agents:read"]);
    body["name"] = "test role".into();

    Mock::given(method("POST"))
        .and(path("/api/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&fixture.server)
        .await;

    let created = fixture
        .roles
        .create(&InvocationContext::new(), &test_spec())
        .await
        .unwrap();
    assert_eq!(created.name, "test role");
    assert_eq!(created.description, None);
    assert_eq!(created.permissions.to_strings(), vec!["agents:read"]);
}

#[tokio::test]
async fn test_create_without_payload_is_protocol_error() {
    let fixture = TestFixture::new().await;

    Mock::given(method("POST"))
        .and(path("/api/roles"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&fixture.server)
        .await;

    let err = fixture
        .roles
        .create(&InvocationContext::new(), &test_spec())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Protocol {
            operation: Operation::Create,
            status: 201,
            ..
        }
    ));
}

#[tokio::test]
async fn test_read_detects_drift() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/roles/{}", ROLE_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(role_json(Some("Changed by hand"), &["agents:read"])),
        )
        .mount(&fixture.server)
        .await;

    let outcome = fixture
        .roles
        .read(&InvocationContext::new(), &recorded_state())
        .await
        .unwrap();

    let ReadOutcome::Present { state, drift } = outcome else {
        panic!("role should be present");
    };
    assert_eq!(state.description.as_deref(), Some("Changed by hand"));
    assert_eq!(drift.len(), 2);
}

#[tokio::test]
async fn test_read_removed_role() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/roles/{}", ROLE_ID)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fixture.server)
        .await;

    let outcome = fixture
        .roles
        .read(&InvocationContext::new(), &recorded_state())
        .await
        .unwrap();
    assert!(outcome.is_removed());
}

// =============================================================================
// Update
// =============================================================================

#[tokio::test]
async fn test_update_without_description_sends_no_description() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PUT"))
        .and(path(format!("/api/roles/{}", ROLE_ID)))
        .and(body_json(serde_json::json!({
            "name": "Test Role",
            "permissions": ["mcp_servers:read"],
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(role_json(Some("Test Description"), &["mcp_servers:read"])),
        )
        .expect(1)
        .mount(&fixture.server)
        .await;

    let desired = RoleSpec::new("Test Role")
        .with_permissions(PermissionList::from_strings(&["mcp_servers:read"]));
    let updated = fixture
        .roles
        .update(&InvocationContext::new(), &recorded_state(), &desired)
        .await
        .unwrap();

    assert_eq!(updated.permissions.to_strings(), vec!["mcp_servers:read"]);
    assert_eq!(updated.description.as_deref(), Some("Test Description"));
}

#[tokio::test]
async fn test_update_rejected() {
    let fixture = TestFixture::new().await;

    Mock::given(method("PUT"))
        .and(path(format!("/api/roles/{}", ROLE_ID)))
        .respond_with(ResponseTemplate::new(422).set_body_string("unknown permission"))
        .mount(&fixture.server)
        .await;

    let err = fixture
        .roles
        .update(&InvocationContext::new(), &recorded_state(), &test_spec())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert!(err.to_string().contains("unknown permission"));
}

// =============================================================================
// Delete and import
// =============================================================================

#[tokio::test]
async fn test_delete_twice() {
    let fixture = TestFixture::new().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/api/roles/{}", ROLE_ID)))
        .respond_with(ResponseTemplate::new(204))
        .up_to_n_times(1)
        .mount(&fixture.server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("/api/roles/{}", ROLE_ID)))
        .respond_with(ResponseTemplate::new(404))
        .mount(&fixture.server)
        .await;

    let ctx = InvocationContext::new();
    fixture.roles.delete(&ctx, &recorded_state()).await.unwrap();
    fixture.roles.delete(&ctx, &recorded_state()).await.unwrap();
}

#[tokio::test]
async fn test_delete_server_error_is_not_success() {
    let fixture = TestFixture::new().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/api/roles/{}", ROLE_ID)))
        .respond_with(ResponseTemplate::new(500))
        .mount(&fixture.server)
        .await;

    let err = fixture
        .roles
        .delete(&InvocationContext::new(), &recorded_state())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_import_and_lookup() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/roles/{}", ROLE_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(role_json(Some("Test Description"), &["agents:read", "agents:write"])),
        )
        .expect(2)
        .mount(&fixture.server)
        .await;

    let ctx = InvocationContext::new();
    let imported = fixture.roles.import(&ctx, ROLE_ID).await.unwrap();
    assert_eq!(imported.into_state(), Some(recorded_state()));

    let looked_up = fixture.roles.lookup(&ctx, ROLE_ID).await.unwrap();
    assert_eq!(looked_up, recorded_state());
}

#[tokio::test]
async fn test_import_uppercase_id_is_kept_verbatim() {
    let fixture = TestFixture::new().await;
    let supplied = ROLE_ID.to_uppercase();

    Mock::given(method("GET"))
        .and(path(format!("/api/roles/{}", supplied)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(role_json(Some("Test Description"), &["agents:read", "agents:write"])),
        )
        .expect(2)
        .mount(&fixture.server)
        .await;

    let ctx = InvocationContext::new();
    let imported = fixture
        .roles
        .import(&ctx, &supplied)
        .await
        .unwrap()
        .into_state()
        .unwrap();
    assert_eq!(imported.id, supplied);

    let outcome = fixture.roles.read(&ctx, &imported).await.unwrap();
    assert_eq!(outcome, ReadOutcome::unchanged(imported));
}

// =============================================================================
// Cancellation and deadlines
// =============================================================================

#[tokio::test]
async fn test_cancel_in_flight_request() {
    let fixture = TestFixture::new().await;

    Mock::given(method("GET"))
        .and(path(format!("/api/roles/{}", ROLE_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(role_json(None, &[]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&fixture.server)
        .await;

    let token = CancellationToken::new();
    let ctx = InvocationContext::new().with_cancellation(token.clone());
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = fixture
        .roles
        .read(&ctx, &recorded_state())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::Cancelled {
            operation: Operation::Read,
            ..
        }
    ));
}

#[tokio::test]
async fn test_deadline_exceeded() {
    let fixture = TestFixture::new().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/api/roles/{}", ROLE_ID)))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
        .mount(&fixture.server)
        .await;

    let ctx = InvocationContext::new().with_timeout(Duration::from_millis(100));
    let err = fixture
        .roles
        .delete(&ctx, &recorded_state())
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::DeadlineExceeded { .. }));
}
